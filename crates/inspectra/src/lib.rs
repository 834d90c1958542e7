pub mod analysis;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod dcf;
pub mod evaluation;
pub mod intent;
pub mod llm;
pub mod report;
pub mod specialist;
pub mod types;
pub mod vector;

// Re-export primary types for convenience
pub use chat::{ChatOutcome, ChatService};
pub use config::AppConfig;
pub use conversation::ConversationStore;
pub use evaluation::{ConversationEvaluation, EvaluationMetric, EvaluationService};
pub use intent::{IntentDecision, IntentDetector, RegexIntentDetector};
pub use llm::{HttpTextGenerator, TextGenerator};
pub use report::{ReportManifest, ReportRequest, ReportStore};
pub use types::{
    AnalysisData, ChatMessage, Conversation, MessageRole, ReportFormat, RiskLevel, SpecialistType,
};

pub use anyhow::{Error, Result};
