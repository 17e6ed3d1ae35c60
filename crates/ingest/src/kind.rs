use std::path::Path;

use crate::error::IngestError;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Document type inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Paginated document with an optional text layer
    Pdf,
    /// Raster image, only readable through OCR
    Image,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" | "md" => Ok(Self::PlainText),
            ext if IMAGE_EXTENSIONS.contains(&ext) => Ok(Self::Image),
            _ => Err(IngestError::UnsupportedFormat(extension)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("invoice.pdf")).unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("scan.PNG")).unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("photo.jpeg")).unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("notes.md")).unwrap(), DocumentKind::PlainText);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = DocumentKind::from_path(Path::new("archive.zip")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ext) if ext == "zip"));

        let err = DocumentKind::from_path(Path::new("README")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ext) if ext.is_empty()));
    }
}
