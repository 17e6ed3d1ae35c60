use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::storage::{check_filename, write_atomic};

/// Directory holding raw uploaded bytes, keyed by original filename.
#[derive(Debug, Clone)]
pub struct UploadArea {
    dir: PathBuf,
}

impl UploadArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store the bytes, replacing an earlier upload with the same name.
    pub async fn store(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        check_filename(filename)?;
        write_atomic(&self.dir, filename, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadArea::new(dir.path().join("uploads"));

        uploads.store("scan.png", b"one").await.unwrap();
        let path = uploads.store("scan.png", b"two").await.unwrap();

        assert_eq!(path, dir.path().join("uploads").join("scan.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadArea::new(dir.path());

        let err = uploads.store("../escape.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFilename(_)));
        assert!(!dir.path().parent().unwrap().join("escape.pdf").exists());
    }
}
