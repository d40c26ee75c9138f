//! Report serializer: wraps the model's answer into a .docx buffer.
//!
//! The answer goes in as literal text. Markdown headings and bullets are not
//! converted to Word formatting.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use thiserror::Error;

pub const REPORT_FILE_NAME: &str = "Memoire_Technique_Genere.docx";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to pack docx: {0}")]
    Pack(String),
}

/// Fixed wording of the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTemplate {
    pub title: &'static str,
    pub disclaimer: &'static str,
    pub separator: &'static str,
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self {
            title: "Mémoire Technique - Ébauche IA",
            disclaimer: "Document généré automatiquement. À relire et compléter.",
            separator: "--------------------------------------------------",
        }
    }
}

/// Builds title, disclaimer, separator and body, and returns the .docx bytes.
pub fn serialize(template: &ReportTemplate, result_text: &str) -> Result<Vec<u8>, ReportError> {
    let title_style = Style::new("Title", StyleType::Paragraph)
        .name("Title")
        .size(56)
        .bold();

    let docx = Docx::new()
        .add_style(title_style)
        .add_paragraph(
            Paragraph::new()
                .style("Title")
                .add_run(Run::new().add_text(template.title)),
        )
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(template.disclaimer)))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(template.separator)))
        .add_paragraph(body_paragraph(result_text));

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ReportError::Pack(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// One paragraph holding the whole answer; newlines become in-paragraph breaks.
fn body_paragraph(text: &str) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line.trim_end_matches('\r'));
    }
    Paragraph::new().add_run(run)
}
