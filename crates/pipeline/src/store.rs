use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs;

use crate::error::PipelineError;
use crate::record::ProcessedDocument;
use crate::storage::{check_filename, write_atomic};

const RESULT_SUFFIX: &str = ".json";

/// Key-value store of processed results, keyed by original filename.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a result, replacing any earlier one for the same filename.
    async fn put(&self, record: &ProcessedDocument) -> Result<(), PipelineError>;

    /// The stored result, exactly as written.
    async fn get(&self, filename: &str) -> Result<ProcessedDocument, PipelineError>;

    /// Filenames with a stored result, in no particular order.
    async fn list(&self) -> Result<Vec<String>, PipelineError>;

    async fn ping(&self) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// One pretty-printed `<filename>.json` per document in a directory.
#[derive(Debug, Clone)]
pub struct FsResultStore {
    dir: PathBuf,
}

impl FsResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_name(filename: &str) -> String {
        format!("{filename}{RESULT_SUFFIX}")
    }
}

#[async_trait]
impl ResultStore for FsResultStore {
    async fn put(&self, record: &ProcessedDocument) -> Result<(), PipelineError> {
        check_filename(&record.filename)?;

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| PipelineError::storage("serializing result", e))?;
        write_atomic(&self.dir, &Self::entry_name(&record.filename), &json).await?;
        Ok(())
    }

    async fn get(&self, filename: &str) -> Result<ProcessedDocument, PipelineError> {
        if check_filename(filename).is_err() {
            return Err(PipelineError::NotFound(filename.to_string()));
        }

        let path = self.dir.join(Self::entry_name(filename));
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(PipelineError::storage(format!("reading {}", path.display()), e)),
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::storage(format!("parsing {}", path.display()), e))
    }

    async fn list(&self) -> Result<Vec<String>, PipelineError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // Nothing processed yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PipelineError::storage(format!("listing {}", self.dir.display()), e)),
        };

        let listing_failed =
            |e: std::io::Error| PipelineError::storage(format!("listing {}", self.dir.display()), e);

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_failed)? {
            if !entry.file_type().await.map_err(listing_failed)?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(filename) = name.strip_suffix(RESULT_SUFFIX) {
                files.push(filename.to_string());
            }
        }
        Ok(files)
    }

    async fn ping(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PipelineError::storage(format!("creating {}", self.dir.display()), e))
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: DashMap<String, ProcessedDocument>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, record: &ProcessedDocument) -> Result<(), PipelineError> {
        self.records.insert(record.filename.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, filename: &str) -> Result<ProcessedDocument, PipelineError> {
        self.records
            .get(filename)
            .map(|r| r.value().clone())
            .ok_or_else(|| PipelineError::NotFound(filename.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.records.iter().map(|r| r.key().clone()).collect())
    }
}
