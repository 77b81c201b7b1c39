//! Resume text extraction.
//!
//! Parsing is CPU-bound and the PDF parser is known to panic on some inputs,
//! so every extraction runs inside `tokio::task::spawn_blocking`. A panic
//! surfaces as a `JoinError` and is reported like any other parse failure.

pub mod docx;
pub mod handlers;
pub mod pdf;

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0} (only .pdf and .docx are accepted)")]
    UnsupportedFormat(String),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("could not read DOCX: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Picks the parser from the file name's extension, ignoring case.
    pub fn from_file_name(name: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            _ => Err(ExtractError::UnsupportedFormat(name.to_string())),
        }
    }

    fn failure(self, cause: String) -> ExtractError {
        match self {
            DocumentKind::Pdf => ExtractError::Pdf(cause),
            DocumentKind::Docx => ExtractError::Docx(cause),
        }
    }
}

/// Extracts plain text from an uploaded document.
pub async fn extract_text(bytes: Bytes, kind: DocumentKind) -> Result<String, ExtractError> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => pdf::extract(&bytes),
        DocumentKind::Docx => docx::extract(&bytes),
    })
    .await
    .map_err(|e| {
        let cause = if e.is_panic() {
            "parser panicked on malformed input".to_string()
        } else {
            e.to_string()
        };
        kind.failure(cause)
    })??;

    debug!(
        "Extracted {} chars from {:?} document ({} bytes)",
        text.chars().count(),
        kind,
        size
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_file_name("cv.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(
            DocumentKind::from_file_name("my.resume.Docx").unwrap(),
            DocumentKind::Docx
        );
    }

    #[test]
    fn test_unknown_extensions_are_unsupported() {
        for name in ["resume.txt", "resume.doc", "resume", ""] {
            assert!(matches!(
                DocumentKind::from_file_name(name),
                Err(ExtractError::UnsupportedFormat(n)) if n == name
            ));
        }
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_an_extraction_error() {
        let result = extract_text(Bytes::from_static(b"definitely not a pdf"), DocumentKind::Pdf).await;
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }

    #[tokio::test]
    async fn test_docx_runs_on_blocking_pool() {
        let bytes = docx::tests::docx_with_body("<w:p><w:r><w:t>Rust engineer</w:t></w:r></w:p>");
        let text = extract_text(Bytes::from(bytes), DocumentKind::Docx).await.unwrap();
        assert_eq!(text, "Rust engineer");
    }
}
