//! Document processing pipeline: stores an upload, extracts its text, tags
//! entities, validates them and persists the result.

pub mod error;
pub mod orchestrator;
pub mod record;
pub mod storage;
pub mod store;
pub mod uploads;

pub use error::PipelineError;
pub use orchestrator::{Pipeline, StageTimings};
pub use record::{PREVIEW_CHARS, ProcessedDocument, preview};
pub use storage::check_filename;
pub use store::{FsResultStore, MemoryResultStore, ResultStore};
pub use uploads::UploadArea;
