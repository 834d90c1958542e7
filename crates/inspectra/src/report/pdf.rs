//! PDF emitter built on printpdf.
//!
//! Simple cursor-based layout on A4 pages: headings and body lines advance a
//! y position, a fresh page starts when the cursor reaches the bottom
//! margin, and the appendix always starts on a new page. The risk line is
//! color coded from the same three-value enum the HTML badge uses.

use anyhow::{anyhow, Result};
use printpdf::*;
use std::io::BufWriter;

use crate::types::RiskLevel;

use super::content::ReportContent;
use super::sections::{build_sections, Block};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 20.0;
const TOP_START: f32 = 280.0;
const BODY_WRAP: usize = 90;

/// Wrap text to a character budget per line, breaking on whitespace and
/// hard-splitting words longer than a whole line. Always returns at least
/// one line so callers can rely on a first line existing.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.len() <= max_chars {
            lines.push(paragraph.to_string());
            continue;
        }
        let before = lines.len();
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.len() + word.len() + 1 > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if word.len() > max_chars {
                let mut count = 0;
                for ch in word.chars() {
                    if count == max_chars {
                        lines.push(std::mem::take(&mut current));
                        count = 0;
                    }
                    current.push(ch);
                    count += 1;
                }
                continue;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
        // A paragraph of only whitespace produces no words.
        if lines.len() == before {
            lines.push(String::new());
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::High => Color::Rgb(Rgb::new(0.8, 0.0, 0.0, None)),
        RiskLevel::Medium => Color::Rgb(Rgb::new(0.9, 0.5, 0.0, None)),
        RiskLevel::Low => Color::Rgb(Rgb::new(0.0, 0.55, 0.0, None)),
    }
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: Mm,
}

impl<'a> PageCursor<'a> {
    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = Mm(TOP_START);
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y - Mm(needed) < Mm(BOTTOM_MARGIN) {
            self.new_page();
        }
    }

    fn text(&mut self, text: &str, size: f32, x: f32, bold: bool, advance: f32) {
        self.ensure_space(advance);
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer.use_text(text, size, Mm(x), self.y, font);
        self.y -= Mm(advance);
    }

    fn colored_text(&mut self, text: &str, size: f32, x: f32, color: Color, advance: f32) {
        self.ensure_space(advance);
        self.layer.set_fill_color(color);
        self.layer.use_text(text, size, Mm(x), self.y, &self.font_bold);
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.y -= Mm(advance);
    }

    fn body_wrapped(&mut self, text: &str, x: f32) {
        for line in wrap_text(text, BODY_WRAP) {
            self.text(&line, 11.0, x, false, 5.0);
        }
    }

    fn spacer(&mut self, amount: f32) {
        self.y -= Mm(amount);
    }
}

pub fn render_pdf(content: &ReportContent) -> Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        &content.metadata.title,
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("Failed to load PDF font: {}", e))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("Failed to load PDF font: {}", e))?;

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        font,
        font_bold,
        y: Mm(TOP_START),
    };

    cursor.text(&content.metadata.title, 22.0, MARGIN_LEFT, true, 12.0);

    for section in build_sections(content) {
        if section.page_break_before {
            cursor.new_page();
        }
        if let Some(title) = &section.title {
            cursor.spacer(4.0);
            cursor.text(title, 16.0, MARGIN_LEFT, true, 8.0);
        }
        for block in &section.blocks {
            render_block(&mut cursor, block);
        }
    }

    cursor.spacer(8.0);
    cursor.text("Generated by Inspectra Platform", 10.0, MARGIN_LEFT, false, 5.0);
    cursor.text(
        &format!(
            "Report Date: {} at {}",
            content.metadata.date, content.metadata.time
        ),
        10.0,
        MARGIN_LEFT,
        false,
        5.0,
    );

    let mut bytes: Vec<u8> = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|e| anyhow!("Failed to save PDF: {}", e))?;
    Ok(bytes)
}

fn render_block(cursor: &mut PageCursor<'_>, block: &Block) {
    match block {
        Block::Paragraph(text) => {
            cursor.body_wrapped(text, MARGIN_LEFT);
            cursor.spacer(2.0);
        }
        Block::Labeled(label, value) => {
            cursor.body_wrapped(&format!("{}: {}", label, value), MARGIN_LEFT);
        }
        Block::SubHeading(title) => {
            cursor.spacer(2.0);
            cursor.text(title, 13.0, MARGIN_LEFT, true, 6.0);
        }
        Block::Bullets(items) => {
            for item in items {
                for (i, line) in wrap_text(item, BODY_WRAP - 4).iter().enumerate() {
                    let text = if i == 0 {
                        format!("- {}", line)
                    } else {
                        format!("  {}", line)
                    };
                    cursor.text(&text, 11.0, MARGIN_LEFT + 4.0, false, 5.0);
                }
            }
            cursor.spacer(2.0);
        }
        Block::Numbered(items) => {
            for (n, item) in items.iter().enumerate() {
                for (i, line) in wrap_text(item, BODY_WRAP - 4).iter().enumerate() {
                    let text = if i == 0 {
                        format!("{}. {}", n + 1, line)
                    } else {
                        format!("   {}", line)
                    };
                    cursor.text(&text, 11.0, MARGIN_LEFT + 4.0, false, 5.0);
                }
            }
            cursor.spacer(2.0);
        }
        Block::RiskBadge(level) => {
            cursor.colored_text(
                &format!("Risk Level: {}", level.as_str()),
                12.0,
                MARGIN_LEFT,
                risk_color(*level),
                6.0,
            );
        }
        Block::Highlight(label, value) => {
            cursor.text(
                &format!("{}: {}", label, value),
                12.0,
                MARGIN_LEFT,
                true,
                6.0,
            );
        }
        Block::MetadataTable(rows) => {
            for (key, value) in rows {
                cursor.ensure_space(6.0);
                let y = cursor.y;
                cursor
                    .layer
                    .use_text(&format!("{}:", key), 10.0, Mm(MARGIN_LEFT), y, &cursor.font_bold);
                let mut value_lines = wrap_text(value, 60).into_iter();
                let first = value_lines.next().unwrap_or_default();
                cursor
                    .layer
                    .use_text(&first, 10.0, Mm(70.0), y, &cursor.font);
                cursor.y -= Mm(6.0);
                for line in value_lines {
                    cursor.text(&line, 10.0, 70.0, false, 6.0);
                }
            }
            cursor.spacer(4.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::content::build_report_content;
    use crate::types::{AnalysisData, SpecialistType};
    use chrono::Utc;

    #[test]
    fn wrap_text_respects_budget() {
        let lines = wrap_text("one two three four five six seven eight", 12);
        assert!(lines.iter().all(|l| l.len() <= 12));
        assert_eq!(lines.join(" "), "one two three four five six seven eight");
    }

    #[test]
    fn wrap_text_preserves_paragraph_breaks() {
        let lines = wrap_text("short\nanother", 40);
        assert_eq!(lines, vec!["short", "another"]);
    }

    #[test]
    fn wrap_text_always_yields_a_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        let lines = wrap_text(&" ".repeat(70), 60);
        assert!(!lines.is_empty());
    }

    #[test]
    fn wrap_text_hard_splits_oversized_words() {
        let word = "x".repeat(25);
        let lines = wrap_text(&format!("lead {} tail", word), 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.concat().matches('x').count(), 25);
    }

    #[test]
    fn whitespace_only_request_still_renders() {
        let analysis = AnalysisData {
            summary: "s".into(),
            findings: vec!["f".into()],
            recommendations: vec!["r".into()],
            risk_level: RiskLevel::Low,
            risk_reasoning: "rr".into(),
            technical_details: "td".into(),
            next_steps: vec![],
        };
        let content = build_report_content(
            SpecialistType::MethodsSpecialist,
            &analysis,
            &[],
            &" ".repeat(70),
            "a@b.com",
            None,
            Utc::now(),
        );
        let bytes = render_pdf(&content).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn produces_nonempty_pdf_bytes() {
        let analysis = AnalysisData {
            summary: "Shell shows active pitting across the lower course".into(),
            findings: (1..=6).map(|i| format!("Finding number {}", i)).collect(),
            recommendations: (1..=8).map(|i| format!("Recommendation {}", i)).collect(),
            risk_level: RiskLevel::High,
            risk_reasoning: "Active corrosion with measurable wall loss".into(),
            technical_details: "UT thickness survey results were reviewed in detail".into(),
            next_steps: vec!["Book survey crew".into(), "Update RBI model".into()],
        };
        let content = build_report_content(
            SpecialistType::CorrosionEngineer,
            &analysis,
            &[],
            "Assess the vessel shell",
            "jane.doe@example.com",
            None,
            Utc::now(),
        );
        let bytes = render_pdf(&content).unwrap();
        assert!(bytes.len() > 1000);
        assert_eq!(&bytes[0..5], b"%PDF-");
    }
}
