use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use extract::{EntityRecognitionEngine, EntityTagger, OllamaClient, OllamaRecognizer, PatternRecognizer};
use ingest::{TesseractCli, TextExtractionEngine, TextExtractor};
use pipeline::{FsResultStore, Pipeline, UploadArea};
use tracing::info;

use crate::cache::RecognitionCache;
use crate::config::{AppConfig, NerBackend};
use crate::metrics::Metrics;
use crate::resilient::ResilientRecognizer;
use crate::retry::RetryPolicy;

pub struct AppState {
    pub pipeline: Pipeline,
    pub metrics: Arc<Metrics>,
    pub cache: Option<Arc<RecognitionCache>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            metrics: Metrics::new(),
            cache: None,
        }
    }

    /// Wire engines, storage and the pipeline from configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        for dir in [&config.storage.upload_dir, &config.storage.results_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        let ocr: Arc<dyn TextExtractionEngine> =
            Arc::new(TesseractCli::new(&config.ocr.tesseract_bin, &config.ocr.language));

        let backend: Arc<dyn EntityRecognitionEngine> = match config.ner.backend {
            NerBackend::Ollama => {
                let client = OllamaClient::new(
                    config.ner.base_url.clone(),
                    config.ner.model.clone(),
                    Duration::from_secs(config.ner.request_timeout_secs),
                )
                .context("Failed to build Ollama client")?;
                Arc::new(OllamaRecognizer::new(client))
            }
            NerBackend::Pattern => Arc::new(PatternRecognizer::new()),
        };

        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(RecognitionCache::new(config.cache.max_entries)));

        let recognizer = ResilientRecognizer::new(
            backend,
            RetryPolicy::from_config(&config.retry),
            cache.clone(),
        );

        let pipeline = Pipeline::new(
            UploadArea::new(&config.storage.upload_dir),
            TextExtractor::new(ocr),
            EntityTagger::new(Arc::new(recognizer)),
            Arc::new(FsResultStore::new(&config.storage.results_dir)),
        );

        info!(
            upload_dir = %config.storage.upload_dir.display(),
            results_dir = %config.storage.results_dir.display(),
            ner_backend = ?config.ner.backend,
            cache = config.cache.enabled,
            "Pipeline ready"
        );

        Ok(Self {
            cache,
            ..Self::new(pipeline)
        })
    }
}
