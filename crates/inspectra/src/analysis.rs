//! Structures raw assistant turns into [`AnalysisData`].
//!
//! The primary path asks the external LLM for a JSON object and pulls the
//! first balanced `{...}` block out of whatever prose surrounds it. Any
//! failure along that path drops to a keyword scan that always produces a
//! complete structure, so report generation never depends on the LLM being
//! up.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::sync::Arc;

use crate::llm::TextGenerator;
use crate::types::{AnalysisData, RiskLevel, SpecialistType};

const HIGH_RISK_TERMS: &[&str] = &["critical", "severe", "immediate", "urgent", "danger"];
const MEDIUM_RISK_TERMS: &[&str] = &["concern", "moderate", "attention", "monitor"];
const FINDING_TERMS: &[&str] = &["found", "identified", "observed", "detected", "noted"];
const RECOMMENDATION_TERMS: &[&str] = &["recommend", "suggest", "should", "advise", "propose"];

/// Extract the first balanced `{...}` block from LLM output. Handles string
/// literals and escapes so braces inside quoted values do not confuse the
/// depth count.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Loose wire shape for the LLM's JSON. Missing fields become defaults and
/// are backfilled before the data leaves this module.
#[derive(Debug, Default, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    findings: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    risk_level: String,
    #[serde(default)]
    risk_reasoning: String,
    #[serde(default)]
    technical_details: String,
    #[serde(default)]
    next_steps: Vec<String>,
}

pub struct AnalysisExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl AnalysisExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Structure the assistant side of a conversation. Never fails: the
    /// keyword fallback runs when the LLM path errors or returns junk.
    pub async fn extract(
        &self,
        specialist: SpecialistType,
        assistant_responses: &[String],
    ) -> AnalysisData {
        let combined = assistant_responses.join("\n\n");
        match self.extract_via_llm(specialist, &combined).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(
                    specialist = specialist.as_wire(),
                    error = %e,
                    "LLM structuring failed, using keyword fallback"
                );
                fallback_analysis(specialist, &combined)
            }
        }
    }

    async fn extract_via_llm(
        &self,
        specialist: SpecialistType,
        combined: &str,
    ) -> Result<AnalysisData> {
        let prompt = format!(
            "Analyze the following {} conversation and respond with ONLY a JSON \
             object, no other text. Keys: summary (string), findings (array of \
             strings), recommendations (array of strings), risk_level (one of \
             \"Low\", \"Medium\", \"High\"), risk_reasoning (string), \
             technical_details (string), next_steps (array of strings).\n\n\
             Conversation:\n{}",
            specialist.display_name(),
            combined
        );

        let response = self.generator.generate(&prompt, None).await?;
        let block = extract_json_object(&response)
            .ok_or_else(|| anyhow!("no JSON object in LLM response"))?;
        let raw: RawAnalysis = serde_json::from_str(block)?;
        Ok(finish(specialist, raw, combined))
    }
}

/// Backfill empty fields from the keyword fallback so every field of the
/// returned structure is non-empty.
fn finish(specialist: SpecialistType, raw: RawAnalysis, source: &str) -> AnalysisData {
    let fallback = fallback_analysis(specialist, source);
    AnalysisData {
        summary: non_empty(raw.summary, fallback.summary),
        findings: non_empty_list(raw.findings, fallback.findings),
        recommendations: non_empty_list(raw.recommendations, fallback.recommendations),
        risk_level: if raw.risk_level.trim().is_empty() {
            fallback.risk_level
        } else {
            RiskLevel::from_label(&raw.risk_level)
        },
        risk_reasoning: non_empty(raw.risk_reasoning, fallback.risk_reasoning),
        technical_details: non_empty(raw.technical_details, fallback.technical_details),
        next_steps: non_empty_list(raw.next_steps, fallback.next_steps),
    }
}

fn non_empty(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn non_empty_list(value: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    if value.iter().all(|s| s.trim().is_empty()) {
        fallback
    } else {
        value
    }
}

/// Deterministic keyword extraction over the conversation text. This is the
/// availability guarantee when the external LLM is down.
pub fn fallback_analysis(specialist: SpecialistType, text: &str) -> AnalysisData {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut findings = Vec::new();
    let mut recommendations = Vec::new();
    for sentence in &sentences {
        let lower = sentence.to_lowercase();
        if FINDING_TERMS.iter().any(|t| lower.contains(t)) && findings.len() < 5 {
            findings.push(sentence.to_string());
        }
        if RECOMMENDATION_TERMS.iter().any(|t| lower.contains(t)) && recommendations.len() < 5 {
            recommendations.push(sentence.to_string());
        }
    }

    let lower = text.to_lowercase();
    let high_matches: Vec<&str> = HIGH_RISK_TERMS
        .iter()
        .copied()
        .filter(|t| lower.contains(t))
        .collect();
    let medium_matches: Vec<&str> = MEDIUM_RISK_TERMS
        .iter()
        .copied()
        .filter(|t| lower.contains(t))
        .collect();

    let (risk_level, risk_reasoning) = if !high_matches.is_empty() {
        (
            RiskLevel::High,
            format!(
                "High-severity indicators present in the discussion: {}",
                high_matches.join(", ")
            ),
        )
    } else if !medium_matches.is_empty() {
        (
            RiskLevel::Medium,
            format!(
                "Moderate-severity indicators present in the discussion: {}",
                medium_matches.join(", ")
            ),
        )
    } else {
        (
            RiskLevel::Low,
            "No elevated-severity indicators were identified in the discussion".to_string(),
        )
    };

    if findings.is_empty() {
        findings = vec![
            format!(
                "{} consultation completed based on the submitted information",
                specialist.display_name()
            ),
            "Detailed technical discussion captured in the conversation transcript".to_string(),
            "No explicit findings statements were identified in the discussion".to_string(),
        ];
    }
    if recommendations.is_empty() {
        recommendations = vec![
            "Review the conversation transcript for context-specific guidance".to_string(),
            format!(
                "Schedule a follow-up {} consultation if conditions change",
                specialist.display_name()
            ),
            "Document any field observations that confirm or contradict this assessment"
                .to_string(),
        ];
    }

    let summary = sentences
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            format!(
                "{} assessment generated from the consultation record",
                specialist.display_name()
            )
        });

    AnalysisData {
        summary,
        findings,
        recommendations,
        risk_level,
        risk_reasoning,
        technical_details: format!(
            "Assessment derived from a keyword scan of the {} conversation record \
             ({} sentences analyzed)",
            specialist.display_name(),
            sentences.len()
        ),
        next_steps: vec![
            "Validate the findings above against current field data".to_string(),
            "Assign owners and target dates to each recommendation".to_string(),
            "Re-run the assessment after corrective actions are complete".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    #[test]
    fn extracts_first_balanced_object() {
        let text = "Here is the analysis:\n{\"summary\": \"ok\", \"nested\": {\"a\": 1}} trailing";
        assert_eq!(
            extract_json_object(text),
            Some("{\"summary\": \"ok\", \"nested\": {\"a\": 1}}")
        );
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_depth() {
        let text = "{\"note\": \"uses { and } freely\"}";
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn no_object_returns_none() {
        assert_eq!(extract_json_object("plain prose, no json"), None);
    }

    #[test]
    fn fallback_flags_high_risk_and_captures_finding() {
        let analysis = fallback_analysis(
            SpecialistType::CorrosionEngineer,
            "We identified severe pitting corrosion, immediate action required.",
        );
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(analysis
            .findings
            .contains(&"We identified severe pitting corrosion, immediate action required".to_string()));
    }

    #[test]
    fn fallback_medium_and_low() {
        let medium = fallback_analysis(
            SpecialistType::SubseaEngineer,
            "There is some concern about the flange seal.",
        );
        assert_eq!(medium.risk_level, RiskLevel::Medium);

        let low = fallback_analysis(SpecialistType::SubseaEngineer, "All systems nominal.");
        assert_eq!(low.risk_level, RiskLevel::Low);
        assert!(!low.findings.is_empty());
        assert!(!low.recommendations.is_empty());
    }

    #[test]
    fn fallback_collects_recommendation_sentences() {
        let analysis = fallback_analysis(
            SpecialistType::MethodsSpecialist,
            "We observed coating breakdown. We recommend recoating the splash zone.",
        );
        assert!(analysis
            .recommendations
            .contains(&"We recommend recoating the splash zone".to_string()));
    }

    #[tokio::test]
    async fn llm_failure_falls_back() {
        let extractor = AnalysisExtractor::new(Arc::new(ScriptedGenerator::always_failing()));
        let analysis = extractor
            .extract(
                SpecialistType::CorrosionEngineer,
                &["Critical wall loss was detected at TML-4.".to_string()],
            )
            .await;
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(!analysis.summary.is_empty());
    }

    #[tokio::test]
    async fn llm_json_is_used_and_backfilled() {
        let response = "Sure, here you go: {\"summary\": \"Pipe section shows wall loss\", \
                        \"findings\": [\"Wall loss at TML-4\"], \"risk_level\": \"High\"}";
        let extractor = AnalysisExtractor::new(Arc::new(ScriptedGenerator::new(vec![Ok(
            response.to_string(),
        )])));
        let analysis = extractor
            .extract(SpecialistType::CorrosionEngineer, &["ignored".to_string()])
            .await;
        assert_eq!(analysis.summary, "Pipe section shows wall loss");
        assert_eq!(analysis.risk_level, RiskLevel::High);
        // Fields the LLM omitted are backfilled, never left empty.
        assert!(!analysis.recommendations.is_empty());
        assert!(!analysis.next_steps.is_empty());
    }
}
