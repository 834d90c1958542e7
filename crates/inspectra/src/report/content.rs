//! Canonical report content model.
//!
//! Built once per generation request from the conversation and extracted
//! analysis, then consumed read-only by each renderer. The build instant is
//! an explicit input so the transform itself stays pure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AnalysisData, ChatMessage, RiskLevel, SpecialistType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub title: String,
    pub report_id: String,
    pub date: String,
    pub time: String,
    pub specialist_type: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_request: String,
    pub report_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub overview: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub original_request: String,
    pub conversation_summary: String,
    pub interaction_count: usize,
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingsSection {
    pub key_findings: Vec<String>,
    pub technical_details: String,
    pub observations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_reasoning: String,
    pub risk_factors: Vec<String>,
}

/// Positional partition of one source recommendation list. The three lists
/// carry no semantic categorization, only slice positions 0-2, 3-5, 6+.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub immediate_actions: Vec<String>,
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextSteps {
    pub actions: Vec<String>,
    pub timeline: String,
    pub follow_up: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub index: usize,
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appendix {
    pub conversation_transcript: Vec<TranscriptEntry>,
    pub references: Vec<String>,
    pub contact_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContent {
    pub metadata: ReportMetadata,
    pub executive_summary: ExecutiveSummary,
    pub conversation_context: ConversationContext,
    pub findings: FindingsSection,
    pub risk_assessment: RiskAssessment,
    pub recommendations: Recommendations,
    pub next_steps: NextSteps,
    pub appendix: Appendix,
}

/// Report id for a generation instant. Collisions within the same second
/// for the same specialist are a known limitation.
pub fn report_id_for(specialist: SpecialistType, built_at: DateTime<Utc>) -> String {
    format!(
        "{}_report_{}",
        specialist.as_wire(),
        built_at.format("%Y%m%d_%H%M%S")
    )
}

/// Display name from the email local part: dots become spaces, words are
/// title-cased ("jane.doe@x.com" becomes "Jane Doe").
pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the full content model. Pure given its inputs; only the metadata
/// date, time and report_id depend on `built_at`.
pub fn build_report_content(
    specialist: SpecialistType,
    analysis: &AnalysisData,
    messages: &[ChatMessage],
    customer_request: &str,
    user_email: &str,
    user_name: Option<&str>,
    built_at: DateTime<Utc>,
) -> ReportContent {
    let display_name = user_name
        .map(str::to_string)
        .unwrap_or_else(|| display_name_from_email(user_email));

    let metadata = ReportMetadata {
        title: format!("{} Analysis Report", specialist.display_name()),
        report_id: report_id_for(specialist, built_at),
        date: built_at.format("%B %d, %Y").to_string(),
        time: built_at.format("%I:%M %p").to_string(),
        specialist_type: specialist.display_name().to_string(),
        customer_name: display_name.clone(),
        customer_email: user_email.to_string(),
        customer_request: customer_request.to_string(),
        report_type: "Chat Conversation Analysis".to_string(),
    };

    let executive_summary = ExecutiveSummary {
        overview: if analysis.summary.trim().is_empty() {
            format!(
                "Comprehensive {} analysis completed for {} based on their inquiry: '{}'",
                specialist.display_name().to_lowercase(),
                display_name,
                customer_request
            )
        } else {
            analysis.summary.clone()
        },
        key_points: extract_key_points(analysis),
    };

    let conversation_context = ConversationContext {
        original_request: customer_request.to_string(),
        conversation_summary: summarize_conversation(messages),
        interaction_count: messages.len(),
        customer_name: display_name,
    };

    let findings = FindingsSection {
        key_findings: analysis.findings.clone(),
        technical_details: analysis.technical_details.clone(),
        observations: extract_observations(messages),
    };

    let risk_assessment = RiskAssessment {
        risk_level: analysis.risk_level,
        risk_reasoning: analysis.risk_reasoning.clone(),
        risk_factors: extract_risk_factors(&analysis.findings),
    };

    let recommendations = Recommendations {
        immediate_actions: slice_of(&analysis.recommendations, 0, 3),
        short_term: slice_of(&analysis.recommendations, 3, 6),
        long_term: analysis.recommendations.get(6..).unwrap_or(&[]).to_vec(),
        priority: "High".to_string(),
    };

    let next_steps = NextSteps {
        actions: analysis.next_steps.clone(),
        timeline: "As discussed".to_string(),
        follow_up: "Schedule follow-up consultation as needed".to_string(),
    };

    let appendix = Appendix {
        conversation_transcript: format_transcript(messages),
        references: crate::specialist::references(specialist),
        contact_info: format!(
            "For questions, contact your Inspectra {} specialist",
            specialist.display_name().to_lowercase()
        ),
    };

    ReportContent {
        metadata,
        executive_summary,
        conversation_context,
        findings,
        risk_assessment,
        recommendations,
        next_steps,
        appendix,
    }
}

fn slice_of(items: &[String], from: usize, to: usize) -> Vec<String> {
    let from = from.min(items.len());
    let to = to.min(items.len());
    items[from..to].to_vec()
}

fn extract_key_points(analysis: &AnalysisData) -> Vec<String> {
    let mut key_points: Vec<String> = analysis.findings.iter().take(3).cloned().collect();
    if let Some(first) = analysis.recommendations.first() {
        key_points.push(format!("Primary recommendation: {}", first));
    }
    if key_points.is_empty() {
        key_points = vec![
            "Comprehensive specialist consultation completed".to_string(),
            "Technical analysis performed".to_string(),
            "Actionable recommendations provided".to_string(),
        ];
    }
    key_points
}

fn summarize_conversation(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return "Detailed technical consultation conducted with specialist.".to_string();
    }
    format!(
        "Interactive consultation involving {} exchanges with the customer. \
         Customer inquiry addressed with detailed technical analysis and expert recommendations.",
        messages.len()
    )
}

fn extract_observations(messages: &[ChatMessage]) -> Vec<String> {
    const OBSERVATION_TERMS: &[&str] = &["observed", "noted", "identified", "detected", "found"];

    let mut observations = Vec::new();
    for message in messages {
        let lower = message.content.to_lowercase();
        if OBSERVATION_TERMS.iter().any(|t| lower.contains(t)) {
            for sentence in message.content.split('.').take(2) {
                let trimmed = sentence.trim();
                if trimmed.len() > 20 {
                    observations.push(trimmed.to_string());
                }
            }
        }
    }

    if observations.is_empty() {
        observations = vec![
            "Detailed technical review completed".to_string(),
            "Comprehensive analysis performed".to_string(),
            "Expert consultation provided".to_string(),
        ];
    }
    observations.truncate(5);
    observations
}

fn extract_risk_factors(findings: &[String]) -> Vec<String> {
    const RISK_TERMS: &[&str] = &["risk", "concern", "issue", "problem", "critical"];

    let mut risk_factors: Vec<String> = findings
        .iter()
        .filter(|f| {
            let lower = f.to_lowercase();
            RISK_TERMS.iter().any(|t| lower.contains(t))
        })
        .cloned()
        .collect();

    if risk_factors.is_empty() {
        risk_factors = vec![
            "Standard operational considerations".to_string(),
            "Routine monitoring requirements".to_string(),
            "Regular maintenance needs".to_string(),
        ];
    }
    risk_factors.truncate(5);
    risk_factors
}

fn format_transcript(messages: &[ChatMessage]) -> Vec<TranscriptEntry> {
    messages
        .iter()
        .enumerate()
        .map(|(i, message)| TranscriptEntry {
            index: i + 1,
            role: message.role.title().to_string(),
            content: message.content.chars().take(500).collect(),
            timestamp: message.timestamp.clone(),
        })
        .collect()
}
