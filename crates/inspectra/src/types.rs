use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The four analysis personas. Unknown wire values fall back to
/// [`SpecialistType::MethodsSpecialist`] prompts and references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistType {
    CorrosionEngineer,
    SubseaEngineer,
    MethodsSpecialist,
    DisciplineHead,
}

impl SpecialistType {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "corrosion_engineer" => Self::CorrosionEngineer,
            "subsea_engineer" => Self::SubseaEngineer,
            "discipline_head" => Self::DisciplineHead,
            _ => Self::MethodsSpecialist,
        }
    }

    /// Snake-case identifier used in file names, report ids and the API.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::CorrosionEngineer => "corrosion_engineer",
            Self::SubseaEngineer => "subsea_engineer",
            Self::MethodsSpecialist => "methods_specialist",
            Self::DisciplineHead => "discipline_head",
        }
    }

    /// Human-readable form used in report headings ("Corrosion Engineer").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CorrosionEngineer => "Corrosion Engineer",
            Self::SubseaEngineer => "Subsea Engineer",
            Self::MethodsSpecialist => "Methods Specialist",
            Self::DisciplineHead => "Discipline Head",
        }
    }
}

/// The three artifact formats a report can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Html,
    Pdf,
}

impl ReportFormat {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "markdown" | "md" | "text" => Some(Self::Markdown),
            "html" | "web" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    /// Requested formats when the caller names none.
    pub fn default_set() -> Vec<Self> {
        vec![Self::Html, Self::Pdf]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// CSS class for the HTML risk badge. Exact lowercase strings are part of
    /// the rendered contract.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Low => "risk-low",
            Self::Medium => "risk-medium",
            Self::High => "risk-high",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn title(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn now(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// One conversation with a specialist, persisted as a single JSON file.
/// Messages are append-only; the file is rewritten whole on each save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub specialist_type: SpecialistType,
    pub user_email: String,
    pub user_name: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub last_updated: String,
    pub message_count: usize,
}

impl Conversation {
    pub fn new(
        conversation_id: String,
        specialist_type: SpecialistType,
        user_email: String,
        user_name: Option<String>,
    ) -> Self {
        Self {
            conversation_id,
            specialist_type,
            user_email,
            user_name,
            messages: Vec::new(),
            last_updated: Utc::now().to_rfc3339(),
            message_count: 0,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.message_count = self.messages.len();
        self.last_updated = Utc::now().to_rfc3339();
    }

    /// All assistant turns, in order. Input to the analysis extractor.
    pub fn assistant_responses(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.clone())
            .collect()
    }
}

/// Structured analysis extracted from a conversation, either by the external
/// LLM or by the deterministic keyword fallback. Every field is guaranteed
/// non-empty by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    pub summary: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
    pub risk_reasoning: String,
    pub technical_details: String,
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialist_wire_roundtrip() {
        for s in [
            SpecialistType::CorrosionEngineer,
            SpecialistType::SubseaEngineer,
            SpecialistType::MethodsSpecialist,
            SpecialistType::DisciplineHead,
        ] {
            assert_eq!(SpecialistType::from_wire(s.as_wire()), s);
        }
    }

    #[test]
    fn unknown_specialist_falls_back() {
        assert_eq!(
            SpecialistType::from_wire("astrologer"),
            SpecialistType::MethodsSpecialist
        );
    }

    #[test]
    fn risk_css_classes_are_exact() {
        assert_eq!(RiskLevel::High.css_class(), "risk-high");
        assert_eq!(RiskLevel::Medium.css_class(), "risk-medium");
        assert_eq!(RiskLevel::Low.css_class(), "risk-low");
    }
}
