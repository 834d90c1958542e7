//! Inline-styled HTML emitter.
//!
//! The risk badge class comes from [`RiskLevel::css_class`] and its three
//! lowercase values are part of the rendered contract. Download buttons link
//! to the sibling Markdown and PDF artifacts by relative path.

use super::content::ReportContent;
use super::sections::{build_sections, Block};

const STYLE: &str = r#"
        @media print {
            body { margin: 0; }
            .no-print { display: none; }
            .page-break { page-break-before: always; }
        }
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 210mm;
            margin: 0 auto;
            padding: 20mm;
            background: #f5f5f5;
        }
        .report-container {
            background: white;
            padding: 40px;
            box-shadow: 0 0 20px rgba(0,0,0,0.1);
        }
        h1 {
            color: #003366;
            border-bottom: 4px solid #003366;
            padding-bottom: 15px;
            font-size: 28px;
            margin-top: 0;
        }
        h2 {
            color: #003366;
            font-size: 22px;
            margin-top: 35px;
            border-left: 5px solid #0066cc;
            padding-left: 15px;
        }
        h3 { color: #0066cc; font-size: 18px; margin-top: 25px; }
        .metadata-table {
            width: 100%;
            border-collapse: collapse;
            margin: 25px 0;
            background-color: #f9f9f9;
        }
        .metadata-table td { padding: 12px; border: 1px solid #ddd; }
        .metadata-table td:first-child {
            font-weight: bold;
            background-color: #e8e8e8;
            width: 30%;
        }
        .risk-badge {
            display: inline-block;
            padding: 8px 16px;
            border-radius: 4px;
            font-weight: bold;
            margin: 10px 0;
        }
        .risk-high { background-color: #ff6666; color: white; }
        .risk-medium { background-color: #ffaa66; color: white; }
        .risk-low { background-color: #90EE90; color: #333; }
        ul, ol { margin: 15px 0; padding-left: 30px; }
        li { margin: 10px 0; line-height: 1.8; }
        .section {
            margin: 30px 0;
            padding: 20px;
            background-color: #fafafa;
            border-left: 3px solid #0066cc;
        }
        .highlight {
            background-color: #fff3cd;
            padding: 15px;
            border-left: 4px solid #ffc107;
            margin: 20px 0;
        }
        .footer {
            margin-top: 50px;
            padding-top: 20px;
            border-top: 2px solid #ddd;
            text-align: center;
            color: #666;
            font-size: 14px;
        }
        .download-buttons {
            margin: 20px 0;
            padding: 15px;
            background-color: #e3f2fd;
            border-radius: 5px;
            text-align: center;
        }
        .download-btn {
            display: inline-block;
            padding: 10px 20px;
            margin: 5px;
            background-color: #0066cc;
            color: white;
            text-decoration: none;
            border-radius: 5px;
            font-weight: bold;
        }
        .download-btn:hover { background-color: #003366; }
        hr { border: none; border-top: 2px solid #0066cc; margin: 30px 0; }
"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_html(content: &ReportContent) -> String {
    let report_id = &content.metadata.report_id;
    let mut out = String::new();

    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n\
         <div class=\"report-container\">\n<h1>{}</h1>\n",
        escape(&content.metadata.title),
        STYLE,
        escape(&content.metadata.title)
    ));

    let mut sections = build_sections(content).into_iter();

    // Metadata table first, then the download bar before the body sections.
    if let Some(metadata) = sections.next() {
        for block in &metadata.blocks {
            render_block(&mut out, block);
        }
    }

    out.push_str(&format!(
        "<div class=\"download-buttons no-print\">\n\
         <p><strong>Download this report in other formats:</strong></p>\n\
         <a href=\"../markdown/{id}.md\" class=\"download-btn\" download>Markdown</a>\n\
         <a href=\"../pdf/{id}.pdf\" class=\"download-btn\" download>PDF</a>\n\
         <a href=\"javascript:window.print()\" class=\"download-btn\">Print</a>\n\
         </div>\n<hr>\n",
        id = report_id
    ));

    for section in sections {
        if section.page_break_before {
            out.push_str("<div class=\"page-break\"></div>\n");
        }
        if let Some(title) = &section.title {
            out.push_str(&format!("<h2>{}</h2>\n", escape(title)));
        }
        out.push_str("<div class=\"section\">\n");
        for block in &section.blocks {
            render_block(&mut out, block);
        }
        out.push_str("</div>\n");
    }

    out.push_str(&format!(
        "<div class=\"footer\">\n\
         <p><strong>Generated by Inspectra Platform</strong></p>\n\
         <p>Report Date: {} at {}</p>\n</div>\n</div>\n</body>\n</html>",
        escape(&content.metadata.date),
        escape(&content.metadata.time)
    ));
    out
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph(text) => out.push_str(&format!("<p>{}</p>\n", escape(text))),
        Block::Labeled(label, value) => out.push_str(&format!(
            "<p><strong>{}:</strong> {}</p>\n",
            escape(label),
            escape(value)
        )),
        Block::SubHeading(title) => out.push_str(&format!("<h3>{}</h3>\n", escape(title))),
        Block::Bullets(items) => {
            out.push_str("<ul>\n");
            for item in items {
                out.push_str(&format!("<li>{}</li>\n", escape(item)));
            }
            out.push_str("</ul>\n");
        }
        Block::Numbered(items) => {
            out.push_str("<ol>\n");
            for item in items {
                out.push_str(&format!("<li>{}</li>\n", escape(item)));
            }
            out.push_str("</ol>\n");
        }
        Block::RiskBadge(level) => out.push_str(&format!(
            "<p><strong>Risk Level:</strong> <span class=\"risk-badge {}\">{}</span></p>\n",
            level.css_class(),
            level.as_str()
        )),
        Block::Highlight(label, value) => out.push_str(&format!(
            "<div class=\"highlight\"><strong>{}:</strong> {}</div>\n",
            escape(label),
            escape(value)
        )),
        Block::MetadataTable(rows) => {
            out.push_str("<table class=\"metadata-table\">\n");
            for (key, value) in rows {
                out.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    escape(key),
                    escape(value)
                ));
            }
            out.push_str("</table>\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::content::build_report_content;
    use crate::types::{AnalysisData, RiskLevel, SpecialistType};
    use chrono::Utc;

    fn content_with_risk(risk_level: RiskLevel) -> ReportContent {
        let analysis = AnalysisData {
            summary: "s".into(),
            findings: vec!["f".into()],
            recommendations: vec!["r".into()],
            risk_level,
            risk_reasoning: "rr".into(),
            technical_details: "td".into(),
            next_steps: vec!["n".into()],
        };
        build_report_content(
            SpecialistType::SubseaEngineer,
            &analysis,
            &[],
            "req",
            "a@b.com",
            Some("A"),
            Utc::now(),
        )
    }

    #[test]
    fn badge_class_matches_risk_level_exactly() {
        for (level, class) in [
            (RiskLevel::High, "risk-badge risk-high"),
            (RiskLevel::Medium, "risk-badge risk-medium"),
            (RiskLevel::Low, "risk-badge risk-low"),
        ] {
            let html = render_html(&content_with_risk(level));
            assert!(html.contains(class), "missing class for {:?}", level);
        }
    }

    #[test]
    fn links_to_sibling_artifacts_and_print() {
        let content = content_with_risk(RiskLevel::Low);
        let html = render_html(&content);
        let id = &content.metadata.report_id;
        assert!(html.contains(&format!("../markdown/{}.md", id)));
        assert!(html.contains(&format!("../pdf/{}.pdf", id)));
        assert!(html.contains("javascript:window.print()"));
        assert!(html.contains("page-break"));
    }

    #[test]
    fn user_text_is_escaped() {
        let analysis = AnalysisData {
            summary: "a <script> & more".into(),
            findings: vec!["f".into()],
            recommendations: vec![],
            risk_level: RiskLevel::Low,
            risk_reasoning: "rr".into(),
            technical_details: "td".into(),
            next_steps: vec![],
        };
        let content = build_report_content(
            SpecialistType::MethodsSpecialist,
            &analysis,
            &[],
            "req",
            "a@b.com",
            Some("A"),
            Utc::now(),
        );
        let html = render_html(&content);
        assert!(html.contains("a &lt;script&gt; &amp; more"));
        assert!(!html.contains("a <script> & more"));
    }
}
