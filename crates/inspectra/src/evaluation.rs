//! Conversation quality evaluation.
//!
//! Heuristic scoring of a conversation across seven weighted metrics, with
//! generated feedback, strengths, improvement areas and recommendations.
//! Scoring is deterministic keyword analysis over the assistant turns; no
//! LLM call is involved. One JSON file per conversation under
//! `evaluations/`, rewritten whole on each evaluation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{Conversation, MessageRole, SpecialistType};

/// Average seconds assumed between a question and its answer when the
/// conversation holds no timed user/assistant pair.
const DEFAULT_RESPONSE_SECS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMetric {
    ResponseQuality,
    TechnicalAccuracy,
    CommunicationClarity,
    ProblemSolving,
    UserSatisfaction,
    ResponseTime,
    ContextUnderstanding,
}

impl EvaluationMetric {
    pub const ALL: [Self; 7] = [
        Self::ResponseQuality,
        Self::TechnicalAccuracy,
        Self::CommunicationClarity,
        Self::ProblemSolving,
        Self::UserSatisfaction,
        Self::ResponseTime,
        Self::ContextUnderstanding,
    ];

    /// Weights sum to 1.0 so the overall score stays in [0, 1].
    pub fn weight(&self) -> f64 {
        match self {
            Self::ResponseQuality => 0.25,
            Self::TechnicalAccuracy => 0.25,
            Self::CommunicationClarity => 0.20,
            Self::ProblemSolving => 0.15,
            Self::UserSatisfaction => 0.10,
            Self::ResponseTime => 0.03,
            Self::ContextUnderstanding => 0.02,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ResponseQuality => "response quality",
            Self::TechnicalAccuracy => "technical accuracy",
            Self::CommunicationClarity => "communication clarity",
            Self::ProblemSolving => "problem solving",
            Self::UserSatisfaction => "user satisfaction",
            Self::ResponseTime => "response time",
            Self::ContextUnderstanding => "context understanding",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: EvaluationMetric,
    pub score: f64,
    pub weight: f64,
    pub feedback: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEvaluation {
    pub conversation_id: String,
    pub agent_role: SpecialistType,
    pub user_email: String,
    pub overall_score: f64,
    pub individual_scores: Vec<MetricScore>,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub recommendations: Vec<String>,
    pub evaluation_date: String,
    pub evaluator_type: String,
}

/// Score a conversation without touching disk.
pub fn evaluate_conversation(
    conversation: &Conversation,
    user_satisfaction: Option<f64>,
) -> ConversationEvaluation {
    let responses = conversation.assistant_responses();
    let now = Utc::now().to_rfc3339();

    let individual_scores: Vec<MetricScore> = EvaluationMetric::ALL
        .iter()
        .map(|&metric| {
            let score = match metric {
                EvaluationMetric::ResponseQuality => response_quality(&responses),
                EvaluationMetric::TechnicalAccuracy => {
                    technical_accuracy(&responses, conversation.specialist_type)
                }
                EvaluationMetric::CommunicationClarity => communication_clarity(&responses),
                EvaluationMetric::ProblemSolving => problem_solving(&responses),
                EvaluationMetric::UserSatisfaction => {
                    user_satisfaction.unwrap_or(0.5).clamp(0.0, 1.0)
                }
                EvaluationMetric::ResponseTime => response_time(conversation),
                EvaluationMetric::ContextUnderstanding => context_understanding(&responses),
            };
            MetricScore {
                metric,
                score,
                weight: metric.weight(),
                feedback: feedback_for(metric, score),
                timestamp: now.clone(),
            }
        })
        .collect();

    let overall_score = individual_scores
        .iter()
        .map(|s| s.score * s.weight)
        .sum::<f64>();

    ConversationEvaluation {
        conversation_id: conversation.conversation_id.clone(),
        agent_role: conversation.specialist_type,
        user_email: conversation.user_email.clone(),
        overall_score,
        strengths: strengths(&individual_scores),
        improvement_areas: improvement_areas(&individual_scores),
        recommendations: recommendations(&individual_scores),
        individual_scores,
        evaluation_date: now,
        evaluator_type: "system".to_string(),
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

fn average(scores: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = scores.collect();
    if collected.is_empty() {
        return 0.0;
    }
    collected.iter().sum::<f64>() / collected.len() as f64
}

fn response_quality(responses: &[String]) -> f64 {
    average(responses.iter().map(|r| {
        let lower = r.to_lowercase();
        let mut score: f64 = 0.0;
        if r.len() > 50 {
            score += 0.4;
        }
        if contains_any(
            &lower,
            &["analysis", "recommendation", "suggestion", "consider"],
        ) {
            score += 0.3;
        }
        if contains_any(&lower, &["based on", "according to", "in my experience"]) {
            score += 0.3;
        }
        score.min(1.0)
    }))
}

/// Domain terms the assistant is expected to use for each persona.
fn role_keywords(specialist: SpecialistType) -> &'static [&'static str] {
    match specialist {
        SpecialistType::CorrosionEngineer => &[
            "corrosion",
            "material",
            "degradation",
            "prevention",
            "inspection",
            "coating",
        ],
        SpecialistType::SubseaEngineer => &[
            "subsea",
            "underwater",
            "rov",
            "pipeline",
            "structure",
            "marine",
        ],
        SpecialistType::MethodsSpecialist => &[
            "methodology",
            "procedure",
            "process",
            "optimization",
            "efficiency",
            "standard",
        ],
        SpecialistType::DisciplineHead => &[
            "strategy",
            "management",
            "coordination",
            "oversight",
            "planning",
            "leadership",
        ],
    }
}

fn technical_accuracy(responses: &[String], specialist: SpecialistType) -> f64 {
    let keywords = role_keywords(specialist);
    let combined = responses.join(" ").to_lowercase();
    let hits = keywords.iter().filter(|k| combined.contains(*k)).count();
    (hits as f64 / keywords.len() as f64).min(1.0)
}

fn communication_clarity(responses: &[String]) -> f64 {
    average(responses.iter().map(|r| {
        let lower = r.to_lowercase();
        let mut score: f64 = 0.0;
        if r.split_whitespace().count() > 10 {
            score += 0.3;
        }
        if contains_any(&lower, &["clearly", "specifically", "in summary", "to clarify"]) {
            score += 0.2;
        }
        if r.contains('.') {
            score += 0.2;
        }
        if r.len() > 100 {
            score += 0.3;
        }
        score.min(1.0)
    }))
}

fn problem_solving(responses: &[String]) -> f64 {
    average(responses.iter().map(|r| {
        let lower = r.to_lowercase();
        let mut score: f64 = 0.0;
        if contains_any(&lower, &["solution", "approach", "strategy", "method"]) {
            score += 0.4;
        }
        if contains_any(&lower, &["step", "process", "procedure", "workflow"]) {
            score += 0.3;
        }
        if contains_any(&lower, &["recommend", "suggest", "propose", "advise"]) {
            score += 0.3;
        }
        score.min(1.0)
    }))
}

fn context_understanding(responses: &[String]) -> f64 {
    average(responses.iter().map(|r| {
        let lower = r.to_lowercase();
        let mut score: f64 = 0.0;
        if contains_any(&lower, &["as mentioned", "previously", "earlier", "before"]) {
            score += 0.5;
        }
        if contains_any(&lower, &["based on your", "considering your", "given your"]) {
            score += 0.5;
        }
        score.min(1.0)
    }))
}

/// Score the average delay between a user message and the assistant reply
/// that follows it. Ten seconds or more scores zero.
fn response_time(conversation: &Conversation) -> f64 {
    let mut delays = Vec::new();
    for pair in conversation.messages.windows(2) {
        if pair[0].role == MessageRole::User && pair[1].role == MessageRole::Assistant {
            let asked = DateTime::parse_from_rfc3339(&pair[0].timestamp);
            let answered = DateTime::parse_from_rfc3339(&pair[1].timestamp);
            if let (Ok(asked), Ok(answered)) = (asked, answered) {
                let secs = (answered - asked).num_milliseconds() as f64 / 1000.0;
                if secs >= 0.0 {
                    delays.push(secs);
                }
            }
        }
    }
    let avg = if delays.is_empty() {
        DEFAULT_RESPONSE_SECS
    } else {
        delays.iter().sum::<f64>() / delays.len() as f64
    };
    (1.0 - avg / 10.0).clamp(0.0, 1.0)
}

fn feedback_for(metric: EvaluationMetric, score: f64) -> String {
    let label = metric.label();
    if score >= 0.8 {
        format!("Excellent {} throughout the conversation", label)
    } else if score >= 0.6 {
        format!("Good {} with room to sharpen", label)
    } else if score >= 0.4 {
        format!("Adequate {} but inconsistent", label)
    } else {
        format!("Needs significant improvement in {}", label)
    }
}

fn strengths(scores: &[MetricScore]) -> Vec<String> {
    let strong: Vec<String> = scores
        .iter()
        .filter(|s| s.score >= 0.8)
        .map(|s| format!("Strong {}", s.metric.label()))
        .collect();
    if strong.is_empty() {
        vec!["Consistent performance across all metrics".to_string()]
    } else {
        strong
    }
}

fn improvement_areas(scores: &[MetricScore]) -> Vec<String> {
    let weak: Vec<String> = scores
        .iter()
        .filter(|s| s.score < 0.6)
        .map(|s| format!("Improve {}", s.metric.label()))
        .collect();
    if weak.is_empty() {
        vec!["Maintain current performance levels".to_string()]
    } else {
        weak
    }
}

/// Targeted advice for the two weakest metrics that are not already strong.
fn recommendations(scores: &[MetricScore]) -> Vec<String> {
    let mut ranked: Vec<&MetricScore> = scores.iter().collect();
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));

    let advice: Vec<String> = ranked
        .iter()
        .filter(|s| s.score < 0.7)
        .take(2)
        .map(|s| advice_for(s.metric))
        .collect();
    if advice.is_empty() {
        vec!["Continue current performance trajectory".to_string()]
    } else {
        advice
    }
}

fn advice_for(metric: EvaluationMetric) -> String {
    match metric {
        EvaluationMetric::ResponseQuality => {
            "Ground responses in the conversation and offer concrete analysis".to_string()
        }
        EvaluationMetric::TechnicalAccuracy => {
            "Use more domain terminology specific to the specialist role".to_string()
        }
        EvaluationMetric::CommunicationClarity => {
            "Structure answers into complete, well-punctuated sentences".to_string()
        }
        EvaluationMetric::ProblemSolving => {
            "Lay out explicit solution steps and actionable recommendations".to_string()
        }
        EvaluationMetric::UserSatisfaction => {
            "Collect explicit user feedback at the end of consultations".to_string()
        }
        EvaluationMetric::ResponseTime => {
            "Reduce the delay between question and answer".to_string()
        }
        EvaluationMetric::ContextUnderstanding => {
            "Reference earlier turns and the user's stated situation".to_string()
        }
    }
}

/// JSON-file persistence for evaluations, one file per conversation.
pub struct EvaluationService {
    dir: PathBuf,
}

impl EvaluationService {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create evaluations dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, conversation_id: &str) -> PathBuf {
        self.dir.join(format!("{}_evaluation.json", conversation_id))
    }

    /// Score the conversation and persist the result, replacing any
    /// previous evaluation for the same conversation.
    pub fn evaluate(
        &self,
        conversation: &Conversation,
        user_satisfaction: Option<f64>,
    ) -> Result<ConversationEvaluation> {
        let evaluation = evaluate_conversation(conversation, user_satisfaction);
        let path = self.path_for(&conversation.conversation_id);
        let json = serde_json::to_string_pretty(&evaluation)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write evaluation file {}", path.display()))?;
        Ok(evaluation)
    }

    pub fn load(&self, conversation_id: &str) -> Result<Option<ConversationEvaluation>> {
        let path = self.path_for(conversation_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read evaluation file {}", path.display()))?;
        let evaluation = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse evaluation file {}", path.display()))?;
        Ok(Some(evaluation))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
