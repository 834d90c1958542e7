//! Shared section tree consumed by the three renderers.
//!
//! The content model is lowered into this tree exactly once per generation,
//! so all formats agree on section ordering and the renderers stay thin
//! emitters over a common shape.

use crate::types::RiskLevel;

use super::content::ReportContent;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    /// Bolded label with inline value ("Timeline: As discussed").
    Labeled(String, String),
    SubHeading(String),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
    /// Risk level line; HTML renders a badge, PDF a colored line.
    RiskBadge(RiskLevel),
    /// Callout box in HTML, bold line elsewhere.
    Highlight(String, String),
    /// Two-column key/value table.
    MetadataTable(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: Option<String>,
    pub page_break_before: bool,
    pub blocks: Vec<Block>,
}

impl Section {
    fn new(title: &str, blocks: Vec<Block>) -> Self {
        Self {
            title: Some(title.to_string()),
            page_break_before: false,
            blocks,
        }
    }

    fn untitled(blocks: Vec<Block>) -> Self {
        Self {
            title: None,
            page_break_before: false,
            blocks,
        }
    }
}

/// Lower the content model into the fixed section ordering: metadata,
/// executive summary, context, findings, risk, recommendations, next steps,
/// appendix. The appendix starts on a fresh page in paged formats.
pub fn build_sections(content: &ReportContent) -> Vec<Section> {
    let mut sections = Vec::new();

    sections.push(Section::untitled(vec![Block::MetadataTable(vec![
        ("Report ID".to_string(), content.metadata.report_id.clone()),
        ("Date".to_string(), content.metadata.date.clone()),
        ("Time".to_string(), content.metadata.time.clone()),
        (
            "Specialist".to_string(),
            content.metadata.specialist_type.clone(),
        ),
        (
            "Customer".to_string(),
            content.metadata.customer_name.clone(),
        ),
        (
            "Customer Request".to_string(),
            content.metadata.customer_request.clone(),
        ),
        (
            "Report Type".to_string(),
            content.metadata.report_type.clone(),
        ),
    ])]));

    sections.push(Section::new(
        "Executive Summary",
        vec![
            Block::Paragraph(content.executive_summary.overview.clone()),
            Block::SubHeading("Key Points".to_string()),
            Block::Bullets(content.executive_summary.key_points.clone()),
        ],
    ));

    sections.push(Section::new(
        "Conversation Context",
        vec![
            Block::Labeled(
                "Customer".to_string(),
                content.conversation_context.customer_name.clone(),
            ),
            Block::Labeled(
                "Original Request".to_string(),
                content.conversation_context.original_request.clone(),
            ),
            Block::Labeled(
                "Summary".to_string(),
                content.conversation_context.conversation_summary.clone(),
            ),
            Block::Labeled(
                "Total Interactions".to_string(),
                content.conversation_context.interaction_count.to_string(),
            ),
        ],
    ));

    sections.push(Section::new(
        "Findings",
        vec![
            Block::SubHeading("Key Findings".to_string()),
            Block::Bullets(content.findings.key_findings.clone()),
            Block::SubHeading("Technical Details".to_string()),
            Block::Paragraph(content.findings.technical_details.clone()),
            Block::SubHeading("Observations".to_string()),
            Block::Bullets(content.findings.observations.clone()),
        ],
    ));

    sections.push(Section::new(
        "Risk Assessment",
        vec![
            Block::RiskBadge(content.risk_assessment.risk_level),
            Block::Labeled(
                "Risk Reasoning".to_string(),
                content.risk_assessment.risk_reasoning.clone(),
            ),
            Block::SubHeading("Risk Factors".to_string()),
            Block::Bullets(content.risk_assessment.risk_factors.clone()),
        ],
    ));

    let mut recommendation_blocks = vec![
        Block::SubHeading("Immediate Actions".to_string()),
        Block::Numbered(content.recommendations.immediate_actions.clone()),
    ];
    if !content.recommendations.short_term.is_empty() {
        recommendation_blocks.push(Block::SubHeading("Short-Term Actions".to_string()));
        recommendation_blocks.push(Block::Numbered(content.recommendations.short_term.clone()));
    }
    if !content.recommendations.long_term.is_empty() {
        recommendation_blocks.push(Block::SubHeading("Long-Term Actions".to_string()));
        recommendation_blocks.push(Block::Numbered(content.recommendations.long_term.clone()));
    }
    recommendation_blocks.push(Block::Highlight(
        "Priority Level".to_string(),
        content.recommendations.priority.clone(),
    ));
    sections.push(Section::new("Recommendations", recommendation_blocks));

    sections.push(Section::new(
        "Next Steps",
        vec![
            Block::SubHeading("Action Items".to_string()),
            Block::Bullets(content.next_steps.actions.clone()),
            Block::Labeled("Timeline".to_string(), content.next_steps.timeline.clone()),
            Block::Labeled(
                "Follow-up".to_string(),
                content.next_steps.follow_up.clone(),
            ),
        ],
    ));

    let mut appendix = Section::new(
        "Appendix",
        vec![
            Block::SubHeading("References".to_string()),
            Block::Bullets(content.appendix.references.clone()),
            Block::SubHeading("Contact Information".to_string()),
            Block::Paragraph(content.appendix.contact_info.clone()),
        ],
    );
    appendix.page_break_before = true;
    sections.push(appendix);

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::content::build_report_content;
    use crate::types::{AnalysisData, SpecialistType};
    use chrono::Utc;

    fn content() -> ReportContent {
        let analysis = AnalysisData {
            summary: "s".into(),
            findings: vec!["f".into()],
            recommendations: vec!["r1".into(), "r2".into()],
            risk_level: RiskLevel::Medium,
            risk_reasoning: "rr".into(),
            technical_details: "td".into(),
            next_steps: vec!["n".into()],
        };
        build_report_content(
            SpecialistType::MethodsSpecialist,
            &analysis,
            &[],
            "req",
            "a@b.com",
            Some("A"),
            Utc::now(),
        )
    }

    #[test]
    fn section_order_is_fixed() {
        let sections = build_sections(&content());
        let titles: Vec<_> = sections.iter().filter_map(|s| s.title.as_deref()).collect();
        assert_eq!(
            titles,
            vec![
                "Executive Summary",
                "Conversation Context",
                "Findings",
                "Risk Assessment",
                "Recommendations",
                "Next Steps",
                "Appendix",
            ]
        );
    }

    #[test]
    fn only_appendix_breaks_the_page() {
        let sections = build_sections(&content());
        let breaking: Vec<_> = sections
            .iter()
            .filter(|s| s.page_break_before)
            .filter_map(|s| s.title.as_deref())
            .collect();
        assert_eq!(breaking, vec!["Appendix"]);
    }

    #[test]
    fn empty_recommendation_tails_are_omitted() {
        let sections = build_sections(&content());
        let recommendations = sections
            .iter()
            .find(|s| s.title.as_deref() == Some("Recommendations"))
            .unwrap();
        assert!(!recommendations
            .blocks
            .contains(&Block::SubHeading("Short-Term Actions".to_string())));
    }
}
