//! PDF text extraction bounded by a character budget.
//!
//! Pages are read in page-number order with `lopdf`, each page's trailing
//! line breaks are dropped, and the pages are joined with `"\n"`. The result
//! is then cut to at most `max_chars` characters. The cut is a plain prefix:
//! it may end mid-word.

use lopdf::Document;
use thiserror::Error;

/// Failures turning uploaded bytes into text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Upload is not a PDF file")]
    NotPdf,

    #[error("PDF could not be parsed: {0}")]
    Malformed(String),

    #[error("PDF has no pages")]
    NoPages,
}

/// Text pulled out of a PDF, already truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
    /// True when the joined page text exceeded the budget.
    pub truncated: bool,
}

/// Converts PDF bytes into prompt-ready text.
#[derive(Debug, Clone, Copy)]
pub struct TextExtractor {
    max_chars: usize,
}

impl TextExtractor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Extract the text of every page, joined by `"\n"` and truncated.
    ///
    /// A page whose content cannot be decoded contributes an empty string.
    /// Scanned PDFs therefore yield empty text, which is valid.
    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        if !is_pdf(bytes) {
            return Err(ExtractionError::NotPdf);
        }

        let doc =
            Document::load_mem(bytes).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ExtractionError::NoPages);
        }

        let page_texts: Vec<String> = pages
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text.trim_end_matches(&['\r', '\n'][..]).to_string(),
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Failed to extract page text");
                    String::new()
                }
            })
            .collect();

        let extracted = self.assemble(&page_texts);

        tracing::debug!(
            page_count = extracted.page_count,
            chars = extracted.text.chars().count(),
            truncated = extracted.truncated,
            "PDF text extracted"
        );

        Ok(extracted)
    }

    /// Join page texts and apply the character budget.
    pub fn assemble<S: AsRef<str>>(&self, pages: &[S]) -> ExtractedText {
        let joined = pages
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("\n");

        let (text, truncated) = truncate_chars(&joined, self.max_chars);

        ExtractedText {
            text: text.to_string(),
            page_count: pages.len(),
            truncated,
        }
    }
}

/// Prefix of `text` holding at most `max_chars` characters, and whether
/// anything was cut. Never splits a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

/// True when the bytes carry the `%PDF-` signature.
pub fn is_pdf(head: &[u8]) -> bool {
    head.starts_with(b"%PDF-")
}
