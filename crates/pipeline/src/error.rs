use extract::TaggingError;
use ingest::IngestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Unsupported document format: {0:?}")]
    UnsupportedFormat(String),

    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("Entity tagging failed: {0}")]
    TaggingFailure(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl PipelineError {
    pub(crate) fn storage(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        PipelineError::StorageFailure(format!("{context}: {err}"))
    }
}

impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedFormat(ext) => PipelineError::UnsupportedFormat(ext),
            IngestError::DocumentUnreadable(reason) => PipelineError::DocumentUnreadable(reason),
            IngestError::ExtractionFailure(reason) => PipelineError::ExtractionFailure(reason),
        }
    }
}

impl From<TaggingError> for PipelineError {
    fn from(err: TaggingError) -> Self {
        PipelineError::TaggingFailure(err.to_string())
    }
}
