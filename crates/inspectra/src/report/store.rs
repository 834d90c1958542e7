//! Report generation and manifest persistence.
//!
//! Renderers run independently per requested format. One format failing is
//! recorded in the outcome and does not block the others; the generation is
//! a partial success while at least one artifact lands on disk.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{AnalysisData, ChatMessage, ReportFormat, SpecialistType};

use super::content::{build_report_content, ReportContent};
use super::html::render_html;
use super::markdown::render_markdown;
use super::pdf::render_pdf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub report_id: String,
    pub specialist_type: SpecialistType,
    pub generated_at: String,
    pub customer_request: String,
    pub user_email: String,
    pub user_name: Option<String>,
    /// format wire name -> filesystem path.
    pub files: BTreeMap<String, String>,
    /// format wire name -> URL path.
    pub download_links: BTreeMap<String, String>,
}

/// Manifest plus per-format render errors for the formats that failed.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub manifest: ReportManifest,
    pub errors: BTreeMap<String, String>,
}

/// Inputs for one generation request.
pub struct ReportRequest<'a> {
    pub specialist: SpecialistType,
    pub analysis: &'a AnalysisData,
    pub messages: &'a [ChatMessage],
    pub customer_request: &'a str,
    pub user_email: &'a str,
    pub user_name: Option<&'a str>,
    pub formats: &'a [ReportFormat],
}

pub struct ReportStore {
    reports_dir: PathBuf,
    download_base: String,
}

impl ReportStore {
    pub fn new(reports_dir: impl Into<PathBuf>, download_base: impl Into<String>) -> Result<Self> {
        let reports_dir = reports_dir.into();
        for format in [ReportFormat::Markdown, ReportFormat::Html, ReportFormat::Pdf] {
            let dir = reports_dir.join(format.as_wire());
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create reports dir {}", dir.display()))?;
        }
        Ok(Self {
            reports_dir,
            download_base: download_base.into(),
        })
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Absolute path of a stored artifact, or None when the filename is not
    /// a plain file name (path traversal is rejected here).
    pub fn artifact_path(&self, format: ReportFormat, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return None;
        }
        Some(self.reports_dir.join(format.as_wire()).join(filename))
    }

    /// Build content, render each requested format independently, persist the
    /// manifest. Errors only when every requested format fails or the
    /// manifest itself cannot be written.
    pub fn generate(&self, request: &ReportRequest<'_>) -> Result<GenerationOutcome> {
        let generated_at = Utc::now();
        let content = build_report_content(
            request.specialist,
            request.analysis,
            request.messages,
            request.customer_request,
            request.user_email,
            request.user_name,
            generated_at,
        );
        let report_id = content.metadata.report_id.clone();

        tracing::info!(
            report_id = %report_id,
            formats = ?request.formats,
            "Generating multi-format report"
        );

        let mut files = BTreeMap::new();
        let mut errors = BTreeMap::new();

        for format in request.formats {
            match self.render_to_disk(*format, &content, &report_id) {
                Ok(path) => {
                    files.insert(format.as_wire().to_string(), path.display().to_string());
                }
                Err(e) => {
                    tracing::warn!(
                        report_id = %report_id,
                        format = format.as_wire(),
                        error = %e,
                        "Report format failed to render"
                    );
                    errors.insert(format.as_wire().to_string(), e.to_string());
                }
            }
        }

        if files.is_empty() {
            return Err(anyhow!(
                "All requested formats failed for report {}",
                report_id
            ));
        }

        let download_links = files
            .iter()
            .map(|(format, path)| {
                let filename = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                (
                    format.clone(),
                    format!("{}/{}/{}", self.download_base, format, filename),
                )
            })
            .collect();

        let manifest = ReportManifest {
            report_id: report_id.clone(),
            specialist_type: request.specialist,
            generated_at: generated_at.to_rfc3339(),
            customer_request: request.customer_request.to_string(),
            user_email: request.user_email.to_string(),
            user_name: request.user_name.map(str::to_string),
            files,
            download_links,
        };

        let manifest_path = self.manifest_path(&report_id);
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
            .with_context(|| format!("Failed to write manifest {}", manifest_path.display()))?;

        Ok(GenerationOutcome { manifest, errors })
    }

    fn render_to_disk(
        &self,
        format: ReportFormat,
        content: &ReportContent,
        report_id: &str,
    ) -> Result<PathBuf> {
        let path = self
            .reports_dir
            .join(format.as_wire())
            .join(format!("{}.{}", report_id, format.extension()));
        match format {
            ReportFormat::Markdown => fs::write(&path, render_markdown(content))?,
            ReportFormat::Html => fs::write(&path, render_html(content))?,
            ReportFormat::Pdf => fs::write(&path, render_pdf(content)?)?,
        }
        Ok(path)
    }

    fn manifest_path(&self, report_id: &str) -> PathBuf {
        self.reports_dir.join(format!("{}_manifest.json", report_id))
    }

    pub fn manifest(&self, report_id: &str) -> Result<Option<ReportManifest>> {
        let path = self.manifest_path(report_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Up to `limit` most-recently-modified manifests, newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<ReportManifest>> {
        let mut entries: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.reports_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_manifest = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_manifest.json"));
            if !is_manifest {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            entries.push((modified, path));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0));

        let mut manifests = Vec::new();
        for (_, path) in entries.into_iter().take(limit) {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable manifest");
                }
            }
        }
        Ok(manifests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;
    use tempfile::TempDir;

    fn analysis() -> AnalysisData {
        AnalysisData {
            summary: "Pitting on the lower shell course".into(),
            findings: vec!["Wall loss at TML-4".into()],
            recommendations: vec!["Re-inspect in 6 months".into()],
            risk_level: RiskLevel::Medium,
            risk_reasoning: "Localized damage".into(),
            technical_details: "UT survey".into(),
            next_steps: vec!["Book crew".into()],
        }
    }

    fn store(tmp: &TempDir) -> ReportStore {
        ReportStore::new(tmp.path().join("reports"), "/api/reports/download").unwrap()
    }

    #[test]
    fn generates_all_three_formats_with_manifest() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let analysis = analysis();
        let outcome = store
            .generate(&ReportRequest {
                specialist: SpecialistType::CorrosionEngineer,
                analysis: &analysis,
                messages: &[],
                customer_request: "Assess the vessel",
                user_email: "jane.doe@example.com",
                user_name: None,
                formats: &[
                    ReportFormat::Markdown,
                    ReportFormat::Html,
                    ReportFormat::Pdf,
                ],
            })
            .unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.manifest.files.len(), 3);
        for (format, path) in &outcome.manifest.files {
            let metadata = fs::metadata(path).unwrap();
            assert!(metadata.len() > 0, "empty artifact for {}", format);
        }
        for (format, link) in &outcome.manifest.download_links {
            assert!(
                link.starts_with(&format!("/api/reports/download/{}/", format)),
                "bad link {}",
                link
            );
        }

        let loaded = store.manifest(&outcome.manifest.report_id).unwrap().unwrap();
        assert_eq!(loaded.report_id, outcome.manifest.report_id);
    }

    #[test]
    fn missing_manifest_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        assert!(store.manifest("nope_report_20250101_000000").unwrap().is_none());
    }

    #[test]
    fn list_recent_returns_newest_first_and_respects_limit() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let analysis = analysis();
        for specialist in [
            SpecialistType::CorrosionEngineer,
            SpecialistType::SubseaEngineer,
            SpecialistType::MethodsSpecialist,
        ] {
            store
                .generate(&ReportRequest {
                    specialist,
                    analysis: &analysis,
                    messages: &[],
                    customer_request: "req",
                    user_email: "a@b.com",
                    user_name: Some("A"),
                    formats: &[ReportFormat::Markdown],
                })
                .unwrap();
        }

        let recent = store.list_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn artifact_path_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        assert!(store
            .artifact_path(ReportFormat::Pdf, "../secrets.pdf")
            .is_none());
        assert!(store
            .artifact_path(ReportFormat::Pdf, "a/b.pdf")
            .is_none());
        assert!(store
            .artifact_path(ReportFormat::Pdf, "report.pdf")
            .is_some());
    }
}
