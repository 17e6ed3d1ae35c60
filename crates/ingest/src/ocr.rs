use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::IngestError;

/// Image-based text recognition capability.
#[async_trait]
pub trait TextExtractionEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize the text of a single-page image file.
    async fn recognize(&self, path: &Path) -> Result<String, IngestError>;

    /// Check that the engine can be used at all.
    async fn ping(&self) -> Result<(), IngestError> {
        Ok(())
    }
}

/// Runs the `tesseract` command-line binary and captures its stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    async fn run<I, S>(&self, args: I) -> Result<std::process::Output, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                IngestError::ExtractionFailure(format!(
                    "failed to launch {}: {}",
                    self.binary.display(),
                    e
                ))
            })
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

#[async_trait]
impl TextExtractionEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, path: &Path) -> Result<String, IngestError> {
        debug!(path = %path.display(), language = %self.language, "Running tesseract");

        let output = self
            .run([
                path.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.language),
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::ExtractionFailure(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn ping(&self) -> Result<(), IngestError> {
        let output = self.run(["--version"]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(IngestError::ExtractionFailure(format!(
                "tesseract --version exited with {}",
                output.status
            )))
        }
    }
}

/// Fixed-output engine for tests and offline runs without tesseract.
pub struct MockOcrEngine {
    text: String,
    failure: Option<String>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            failure: None,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            text: String::new(),
            failure: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Number of `recognize` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every path handed to `recognize`, with the file bytes seen at call time
    pub fn inputs(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.inputs.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextExtractionEngine for MockOcrEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, path: &Path) -> Result<String, IngestError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let bytes = tokio::fs::read(path).await.unwrap_or_default();
        if let Ok(mut seen) = self.inputs.lock() {
            seen.push((path.to_path_buf(), bytes));
        }
        match &self.failure {
            Some(reason) => Err(IngestError::ExtractionFailure(reason.clone())),
            None => Ok(self.text.clone()),
        }
    }
}
