//! Markdown emitter over the shared section tree.

use super::content::ReportContent;
use super::sections::{build_sections, Block, Section};

pub fn render_markdown(content: &ReportContent) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n", content.metadata.title));

    for section in build_sections(content) {
        out.push_str("\n---\n\n");
        render_section(&mut out, &section);
    }

    out.push_str(&format!(
        "\n---\n\n*Generated by Inspectra Platform*  \n*Report Date: {} at {}*\n",
        content.metadata.date, content.metadata.time
    ));
    out
}

fn render_section(out: &mut String, section: &Section) {
    if let Some(title) = &section.title {
        out.push_str(&format!("## {}\n", title));
    }
    for block in &section.blocks {
        match block {
            Block::Paragraph(text) => out.push_str(&format!("\n{}\n", text)),
            Block::Labeled(label, value) => out.push_str(&format!("\n**{}:** {}\n", label, value)),
            Block::SubHeading(title) => out.push_str(&format!("\n### {}\n", title)),
            Block::Bullets(items) => {
                out.push('\n');
                for item in items {
                    out.push_str(&format!("- {}\n", item));
                }
            }
            Block::Numbered(items) => {
                out.push('\n');
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, item));
                }
            }
            Block::RiskBadge(level) => {
                out.push_str(&format!("\n**Risk Level:** {}\n", level.as_str()))
            }
            Block::Highlight(label, value) => {
                out.push_str(&format!("\n**{}:** {}\n", label, value))
            }
            Block::MetadataTable(rows) => {
                out.push('\n');
                for (key, value) in rows {
                    out.push_str(&format!("**{}:** {}  \n", key, value));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::content::build_report_content;
    use crate::types::{AnalysisData, RiskLevel, SpecialistType};
    use chrono::Utc;

    #[test]
    fn renders_all_section_headings_in_order() {
        let analysis = AnalysisData {
            summary: "Shell shows active pitting".into(),
            findings: vec!["Wall loss at TML-4".into()],
            recommendations: vec!["Re-inspect in 6 months".into()],
            risk_level: RiskLevel::High,
            risk_reasoning: "Active corrosion".into(),
            technical_details: "UT data".into(),
            next_steps: vec!["Book survey crew".into()],
        };
        let content = build_report_content(
            SpecialistType::CorrosionEngineer,
            &analysis,
            &[],
            "Assess vessel",
            "jane.doe@x.com",
            None,
            Utc::now(),
        );
        let md = render_markdown(&content);

        let headings = [
            "# Corrosion Engineer Analysis Report",
            "## Executive Summary",
            "## Conversation Context",
            "## Findings",
            "## Risk Assessment",
            "## Recommendations",
            "## Next Steps",
            "## Appendix",
        ];
        let mut last = 0;
        for heading in headings {
            let at = md[last..].find(heading);
            assert!(at.is_some(), "missing or out of order: {}", heading);
            last += at.unwrap();
        }
        assert!(md.contains("**Risk Level:** High"));
        assert!(md.contains("- Wall loss at TML-4"));
        assert!(md.contains("1. Re-inspect in 6 months"));
    }
}
