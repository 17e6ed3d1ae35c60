use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsupported document format: {0:?}")]
    UnsupportedFormat(String),

    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),
}

impl IngestError {
    pub(crate) fn unreadable(path: &Path, reason: impl std::fmt::Display) -> Self {
        IngestError::DocumentUnreadable(format!("{}: {}", path.display(), reason))
    }
}
