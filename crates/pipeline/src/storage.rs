use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::PipelineError;

/// Reject names that are empty or could escape the storage directory.
pub fn check_filename(filename: &str) -> Result<(), PipelineError> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);

    if invalid {
        return Err(PipelineError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Write `bytes` to `dir/name` through a temp file and a rename, so readers
/// see either the previous file or the complete new one. The temp name has a
/// fixed length, so any name the filesystem accepts can be written.
pub(crate) async fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| PipelineError::storage(format!("creating {}", dir.display()), e))?;

    let target = dir.join(name);
    let temp = dir.join(format!(".{}.tmp", Uuid::new_v4().simple()));

    if let Err(e) = fs::write(&temp, bytes).await {
        let _ = fs::remove_file(&temp).await;
        return Err(PipelineError::storage(format!("writing {}", temp.display()), e));
    }

    if let Err(e) = fs::rename(&temp, &target).await {
        let _ = fs::remove_file(&temp).await;
        return Err(PipelineError::storage(format!("renaming to {}", target.display()), e));
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_filename() {
        for ok in ["invoice.pdf", "scan 01.PNG", ".hidden.txt", "a..b.pdf"] {
            assert!(check_filename(ok).is_ok(), "{ok}");
        }
        for bad in ["", ".", "..", "../etc/passwd", "dir/file.pdf", "c:\\x.pdf", "nul\0.pdf"] {
            assert!(
                matches!(check_filename(bad), Err(PipelineError::InvalidFilename(_))),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();

        write_atomic(dir.path(), "a.json", b"first").await.unwrap();
        let path = write_atomic(dir.path(), "a.json", b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.json")]);
    }

    #[tokio::test]
    async fn test_write_atomic_accepts_long_names() {
        let dir = tempfile::tempdir().unwrap();
        let name = format!("{}.json", "a".repeat(230));

        let path = write_atomic(dir.path(), &name, b"{}").await.unwrap();

        assert_eq!(path, dir.path().join(&name));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_atomic_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results");

        write_atomic(&nested, "x.json", b"{}").await.unwrap();
        assert!(nested.join("x.json").is_file());
    }
}
