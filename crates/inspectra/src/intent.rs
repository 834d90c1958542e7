//! Report-intent detection over free-text chat messages.
//!
//! Heuristic matching, not parsing. The contract is a best-effort trigger:
//! false positives and negatives are acceptable, and any single pattern
//! match is enough to fire.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::ReportFormat;

/// Outcome of running a detector over one message.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentDecision {
    pub is_report_request: bool,
    /// What the report should be about, when the message says.
    pub context: Option<String>,
}

impl IntentDecision {
    pub fn none() -> Self {
        Self {
            is_report_request: false,
            context: None,
        }
    }
}

/// Strategy seam so the regex heuristic can be swapped for something
/// smarter without touching the chat service.
pub trait IntentDetector: Send + Sync {
    fn detect(&self, message: &str) -> IntentDecision;
}

static REPORT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:generate|create|produce|make|prepare|build)\b.*\breport\b",
        r"(?i)\breport\s+(?:on|about|of|for)\b",
        r"(?i)\bcan you provide\b",
        r"(?i)\b(?:download|export|save)\b.*\bas\s+(?:pdf|html|markdown|md)\b",
        r"(?i)\b(?:need|want)\b.*\b(?:report|analysis)\b",
        r"(?i)\bshow me\b.*\breport\b",
        r"(?i)\b(?:inspection|assessment)\s+report\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid intent pattern {p}: {e}")))
    .collect()
});

static CONTEXT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:inspection|assessment)\s+of\s+(.+?)(?:[.?!]|$)",
        r"(?i)\breport\s+(?:about|on|regarding|for)\s+(.+?)(?:[.?!]|$)",
        r"(?i)\b(?:about|regarding)\s+(.+?)(?:[.?!]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid context pattern {p}: {e}")))
    .collect()
});

/// Fixed, ordered regex set. First match wins; order only matters in that
/// any match suffices.
pub struct RegexIntentDetector;

impl IntentDetector for RegexIntentDetector {
    fn detect(&self, message: &str) -> IntentDecision {
        let hit = REPORT_PATTERNS.iter().find_map(|p| p.find(message));
        let Some(hit) = hit else {
            return IntentDecision::none();
        };

        let context = extract_context(message, hit.start());
        IntentDecision {
            is_report_request: true,
            context: Some(context),
        }
    }
}

/// Secondary extraction: about/on/regarding/for phrases first, then the
/// sentence containing the primary match, then the whole message.
fn extract_context(message: &str, match_start: usize) -> String {
    for pattern in CONTEXT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(message) {
            if let Some(m) = caps.get(1) {
                let context = m.as_str().trim();
                if !context.is_empty() {
                    return context.to_string();
                }
            }
        }
    }

    let mut offset = 0;
    for sentence in message.split('.') {
        let end = offset + sentence.len();
        if match_start <= end {
            let trimmed = sentence.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
            break;
        }
        offset = end + 1;
    }

    message.trim().to_string()
}

static FORMAT_TOKENS: LazyLock<Vec<(ReportFormat, Regex)>> = LazyLock::new(|| {
    [
        (ReportFormat::Pdf, r"(?i)\bpdf\b"),
        (ReportFormat::Html, r"(?i)\b(?:html|web)\b"),
        (ReportFormat::Markdown, r"(?i)\b(?:markdown|md|text)\b"),
    ]
    .iter()
    .map(|(f, p)| {
        (
            *f,
            Regex::new(p).unwrap_or_else(|e| panic!("invalid format pattern {p}: {e}")),
        )
    })
    .collect()
});

/// Formats the message asks for, in order of first occurrence. Defaults to
/// html + pdf when no format token appears.
pub fn extract_formats(message: &str) -> Vec<ReportFormat> {
    let mut found: Vec<(usize, ReportFormat)> = FORMAT_TOKENS
        .iter()
        .filter_map(|(format, pattern)| pattern.find(message).map(|m| (m.start(), *format)))
        .collect();

    if found.is_empty() {
        return ReportFormat::default_set();
    }
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, format)| format).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(message: &str) -> IntentDecision {
        RegexIntentDetector.detect(message)
    }

    #[test]
    fn report_phrasings_fire() {
        assert!(detect("Can you generate a report on the corrosion findings?").is_report_request);
        assert!(detect("I need the report").is_report_request);
        assert!(detect("please export as pdf").is_report_request);
        assert!(detect("Show me the inspection report for riser R-12").is_report_request);
    }

    #[test]
    fn plain_questions_do_not_fire() {
        assert!(!detect("What is the corrosion rate here?").is_report_request);
        assert!(!detect("Tell me about cathodic protection basics").is_report_request);
    }

    #[test]
    fn context_comes_from_about_on_phrases() {
        let decision = detect("Can you generate a report on the corrosion findings?");
        assert_eq!(decision.context.as_deref(), Some("the corrosion findings"));
    }

    #[test]
    fn context_falls_back_to_matching_sentence() {
        let decision = detect("Thanks. I need the report by Friday. Cheers");
        assert_eq!(decision.context.as_deref(), Some("I need the report by Friday"));
    }

    #[test]
    fn context_falls_back_to_whole_message() {
        let decision = detect("please export as pdf");
        assert_eq!(decision.context.as_deref(), Some("please export as pdf"));
    }

    #[test]
    fn formats_in_first_occurrence_order() {
        assert_eq!(
            extract_formats("please send as pdf and markdown"),
            vec![ReportFormat::Pdf, ReportFormat::Markdown]
        );
        assert_eq!(
            extract_formats("markdown then a web page then pdf"),
            vec![
                ReportFormat::Markdown,
                ReportFormat::Html,
                ReportFormat::Pdf
            ]
        );
    }

    #[test]
    fn formats_default_when_none_named() {
        assert_eq!(
            extract_formats("generate the usual report"),
            vec![ReportFormat::Html, ReportFormat::Pdf]
        );
    }
}
