use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::kind::DocumentKind;
use crate::ocr::TextExtractionEngine;
use crate::pdf::{PdfExtractSource, PdfTextSource};
use crate::render::{LopdfPageRenderer, PdfPageRenderer};

/// Turns a stored document into raw text, dispatching on its extension.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<dyn TextExtractionEngine>,
    pdf: Arc<dyn PdfTextSource>,
    renderer: Arc<dyn PdfPageRenderer>,
}

impl TextExtractor {
    pub fn new(ocr: Arc<dyn TextExtractionEngine>) -> Self {
        Self::with_pdf_source(ocr, Arc::new(PdfExtractSource))
    }

    pub fn with_pdf_source(ocr: Arc<dyn TextExtractionEngine>, pdf: Arc<dyn PdfTextSource>) -> Self {
        Self {
            ocr,
            pdf,
            renderer: Arc::new(LopdfPageRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PdfPageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn ocr_engine(&self) -> &Arc<dyn TextExtractionEngine> {
        &self.ocr
    }

    pub async fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let kind = DocumentKind::from_path(path)?;
        debug!(path = %path.display(), ?kind, "Extracting text");

        match kind {
            DocumentKind::Pdf => self.extract_pdf(path).await,
            DocumentKind::Image => {
                ensure_decodable_image(path).await?;
                self.ocr.recognize(path).await
            }
            DocumentKind::PlainText => read_plain_text(path).await,
        }
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String, IngestError> {
        let source = Arc::clone(&self.pdf);
        let owned = path.to_path_buf();

        // pdf-extract can panic on malformed input; a panicked task counts as unreadable
        let pages = tokio::task::spawn_blocking(move || source.page_texts(&owned))
            .await
            .map_err(|e| IngestError::unreadable(path, format!("PDF parser aborted: {e}")))??;

        let page_count = pages.len();
        let text = pages.concat();

        if text.trim().is_empty() {
            info!(
                path = %path.display(),
                pages = page_count,
                "PDF has no text layer, falling back to OCR"
            );
            return self.ocr_scanned_pdf(path).await;
        }

        debug!(path = %path.display(), pages = page_count, chars = text.len(), "PDF text layer read");
        Ok(text)
    }

    /// OCR every page image of a scanned PDF, in page order. A PDF with no
    /// page images at all goes to the engine as-is.
    async fn ocr_scanned_pdf(&self, path: &Path) -> Result<String, IngestError> {
        let renderer = Arc::clone(&self.renderer);
        let owned = path.to_path_buf();

        let page_files = tokio::task::spawn_blocking(move || -> Result<Vec<NamedTempFile>, IngestError> {
            renderer
                .render_pages(&owned)?
                .into_iter()
                .flatten()
                .map(|png| write_page_image(&png))
                .collect()
        })
        .await
        .map_err(|e| IngestError::unreadable(path, format!("PDF renderer aborted: {e}")))??;

        if page_files.is_empty() {
            warn!(path = %path.display(), "No page images found, passing the PDF to OCR directly");
            return self.ocr.recognize(path).await;
        }

        let mut text = String::new();
        for (index, page) in page_files.iter().enumerate() {
            let page_text = self.ocr.recognize(page.path()).await?;
            debug!(page = index + 1, chars = page_text.len(), "Page image recognized");
            text.push_str(&page_text);
        }
        Ok(text)
    }
}

/// Page image in a self-deleting `.png` temp file
fn write_page_image(png: &[u8]) -> Result<NamedTempFile, IngestError> {
    let failure = |e: std::io::Error| {
        IngestError::ExtractionFailure(format!("failed to stage page image: {e}"))
    };

    let mut file = tempfile::Builder::new()
        .prefix("docproc-page-")
        .suffix(".png")
        .tempfile()
        .map_err(failure)?;
    file.write_all(png).map_err(failure)?;
    file.flush().map_err(failure)?;
    Ok(file)
}

async fn read_plain_text(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| IngestError::unreadable(path, e))?;

    String::from_utf8(bytes).map_err(|e| IngestError::unreadable(path, e))
}

/// Decode the image header so corrupt files are reported before OCR runs.
async fn ensure_decodable_image(path: &Path) -> Result<(), IngestError> {
    let owned: PathBuf = path.to_path_buf();

    let dimensions = tokio::task::spawn_blocking(move || -> Result<(u32, u32), IngestError> {
        let reader = image::ImageReader::open(&owned)
            .map_err(|e| IngestError::unreadable(&owned, e))?
            .with_guessed_format()
            .map_err(|e| IngestError::unreadable(&owned, e))?;

        reader
            .into_dimensions()
            .map_err(|e| IngestError::unreadable(&owned, e))
    })
    .await
    .map_err(|e| IngestError::unreadable(path, format!("image decoder aborted: {e}")))??;

    debug!(path = %path.display(), width = dimensions.0, height = dimensions.1, "Image header decoded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::MockOcrEngine;
    use crate::test_support::{make_pdf, make_scanned_pdf, write_png};

    fn extractor(ocr: Arc<MockOcrEngine>) -> TextExtractor {
        TextExtractor::new(ocr)
    }

    #[tokio::test]
    async fn test_pdf_pages_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, make_pdf(&["Alpha", "Bravo", "Charlie"])).unwrap();
        let ocr = Arc::new(MockOcrEngine::new("should not be used"));

        let text = extractor(ocr.clone()).extract(&path).await.unwrap();

        let alpha = text.find("Alpha").expect("first page text");
        let bravo = text.find("Bravo").expect("second page text");
        let charlie = text.find("Charlie").expect("third page text");
        assert!(alpha < bravo && bravo < charlie, "got: {text:?}");
        assert_eq!(ocr.calls(), 0);
    }

    /// Text layer that is present but blank on every page
    struct BlankPages(usize);

    impl PdfTextSource for BlankPages {
        fn page_texts(&self, _path: &Path) -> Result<Vec<String>, IngestError> {
            Ok(vec![String::new(); self.0])
        }
    }

    #[tokio::test]
    async fn test_scanned_pdf_page_image_goes_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanned.pdf");
        std::fs::write(&path, make_scanned_pdf(64, 48)).unwrap();
        let ocr = Arc::new(MockOcrEngine::new("recognized from scan"));

        let text = TextExtractor::with_pdf_source(ocr.clone(), Arc::new(BlankPages(1)))
            .extract(&path)
            .await
            .unwrap();

        assert_eq!(text, "recognized from scan");
        let inputs = ocr.inputs();
        assert_eq!(inputs.len(), 1);
        let (seen_path, seen_bytes) = &inputs[0];
        assert_eq!(seen_path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_ne!(seen_path, &path);
        let page = image::load_from_memory(seen_bytes).expect("OCR input is an image");
        assert_eq!((page.width(), page.height()), (64, 48));
        // staged page images are cleaned up afterwards
        assert!(!seen_path.exists());
    }

    #[tokio::test]
    async fn test_pdf_without_page_images_goes_to_ocr_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.pdf");
        std::fs::write(&path, make_pdf(&[""])).unwrap();
        let ocr = Arc::new(MockOcrEngine::new("recognized from pdf"));

        let text = extractor(ocr.clone()).extract(&path).await.unwrap();

        assert_eq!(text, "recognized from pdf");
        assert_eq!(ocr.calls(), 1);
        assert_eq!(ocr.inputs()[0].0, path);
    }

    #[tokio::test]
    async fn test_image_goes_straight_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        write_png(&path);
        let ocr = Arc::new(MockOcrEngine::new("TOTAL 12.00"));

        let text = extractor(ocr.clone()).extract(&path).await.unwrap();

        assert_eq!(text, "TOTAL 12.00");
        assert_eq!(ocr.calls(), 1);
    }

    #[tokio::test]
    async fn test_image_with_no_text_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        write_png(&path);

        let text = extractor(Arc::new(MockOcrEngine::new(""))).extract(&path).await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_image_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let ocr = Arc::new(MockOcrEngine::new("unused"));

        let err = extractor(ocr.clone()).extract(&path).await.unwrap_err();

        assert!(matches!(err, IngestError::DocumentUnreadable(_)), "got: {err:?}");
        assert_eq!(ocr.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = Arc::new(MockOcrEngine::new("unused"));

        for name in ["missing.pdf", "missing.png", "missing.txt"] {
            let err = extractor(ocr.clone())
                .extract(&dir.path().join(name))
                .await
                .unwrap_err();
            assert!(matches!(err, IngestError::DocumentUnreadable(_)), "{name}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, b"PK").unwrap();

        let err = extractor(Arc::new(MockOcrEngine::new(""))).extract(&path).await.unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_plain_text_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "Paid 100 on 2024-01-15").unwrap();

        let text = extractor(Arc::new(MockOcrEngine::new(""))).extract(&path).await.unwrap();
        assert_eq!(text, "Paid 100 on 2024-01-15");
    }

    #[tokio::test]
    async fn test_ocr_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        write_png(&path);

        let err = extractor(Arc::new(MockOcrEngine::failing("engine crashed")))
            .extract(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::ExtractionFailure(_)));
    }
}
