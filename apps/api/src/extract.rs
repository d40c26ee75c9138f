//! PDF text extraction.
//!
//! `pdf_extract` can panic on malformed input instead of returning an error,
//! so every call goes through `catch_unwind` and a panic becomes an
//! `ExtractionError` like any other parse failure.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0}")]
    Parse(String),

    #[error("the PDF parser crashed on this document (malformed file?)")]
    Panicked,
}

/// Converts an uploaded document into plain text.
///
/// Carried in `AppState` as `Arc<dyn TextExtractor>`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// `TextExtractor` backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        extract_text(bytes)
    }
}

/// Extracts the text of every page and concatenates it with no separator.
/// Pages without a text layer contribute nothing.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages.concat()),
        Ok(Err(e)) => Err(ExtractionError::Parse(e.to_string())),
        Err(_) => Err(ExtractionError::Panicked),
    }
}

/// True when the text is long enough to be worth sending to the model.
pub fn has_enough_text(text: &str, min_chars: usize) -> bool {
    text.chars().count() > min_chars
}
