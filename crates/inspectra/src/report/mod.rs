//! Multi-format report generation.
//!
//! One canonical content model is lowered into a shared section tree, and
//! each output format is a thin emitter over that tree.

pub mod content;
pub mod html;
pub mod markdown;
pub mod pdf;
pub mod sections;
pub mod store;

pub use content::{build_report_content, display_name_from_email, report_id_for, ReportContent};
pub use store::{GenerationOutcome, ReportManifest, ReportRequest, ReportStore};
