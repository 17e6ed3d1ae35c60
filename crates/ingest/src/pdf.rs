use std::path::Path;

use crate::error::IngestError;

/// Source of per-page text for paginated documents.
///
/// Implementations are synchronous; callers run them on a blocking thread.
pub trait PdfTextSource: Send + Sync {
    /// Text of every page, in document order.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, IngestError>;
}

/// Reads the embedded text layer with the `pdf-extract` crate.
/// Scanned PDFs without a text layer come back as empty pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractSource;

impl PdfTextSource for PdfExtractSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, IngestError> {
        let bytes = std::fs::read(path).map_err(|e| IngestError::unreadable(path, e))?;

        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| IngestError::unreadable(path, format!("PDF parsing failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_pdf;

    #[test]
    fn test_pages_in_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two-pages.pdf");
        std::fs::write(&path, make_pdf(&["First page", "Second page"])).unwrap();

        let pages = PdfExtractSource.page_texts(&path).unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("First"), "got: {:?}", pages);
        assert!(pages[1].contains("Second"), "got: {:?}", pages);
    }

    #[test]
    fn test_corrupt_pdf_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = PdfExtractSource.page_texts(&path).unwrap_err();
        assert!(matches!(err, IngestError::DocumentUnreadable(_)));
    }
}
