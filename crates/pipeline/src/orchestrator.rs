use std::sync::Arc;
use std::time::{Duration, Instant};

use extract::EntityTagger;
use ingest::TextExtractor;
use tracing::{info, warn};
use validate::RuleRegistry;

use crate::error::PipelineError;
use crate::record::ProcessedDocument;
use crate::storage::check_filename;
use crate::store::ResultStore;
use crate::uploads::UploadArea;

/// Wall-clock time spent in each step of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub extract: Duration,
    pub tag: Duration,
    pub validate: Duration,
    pub store: Duration,
}

/// Upload → extract → tag → validate → persist, one step after the other.
#[derive(Clone)]
pub struct Pipeline {
    uploads: UploadArea,
    extractor: TextExtractor,
    tagger: EntityTagger,
    rules: RuleRegistry,
    store: Arc<dyn ResultStore>,
}

impl Pipeline {
    pub fn new(
        uploads: UploadArea,
        extractor: TextExtractor,
        tagger: EntityTagger,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            uploads,
            extractor,
            tagger,
            rules: RuleRegistry::standard(),
            store,
        }
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    pub fn tagger(&self) -> &EntityTagger {
        &self.tagger
    }

    /// Run the whole pipeline for one uploaded document.
    ///
    /// Any failing step aborts the run and nothing is written to the result
    /// store. The returned record is the one that was persisted.
    pub async fn process(&self, bytes: &[u8], filename: &str) -> Result<ProcessedDocument, PipelineError> {
        self.process_timed(bytes, filename).await.map(|(record, _)| record)
    }

    /// [`Pipeline::process`], also reporting how long each step took.
    pub async fn process_timed(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<(ProcessedDocument, StageTimings), PipelineError> {
        check_filename(filename)?;
        let started = Instant::now();

        let path = self.uploads.store(filename, bytes).await?;
        info!(
            filename,
            bytes = bytes.len(),
            sha256 = %ingest::content_digest(bytes),
            "Upload stored"
        );

        let result = self.run_stages(filename, &path).await;
        match &result {
            Ok((record, _)) => info!(
                filename,
                entities = record.entities.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Document processed"
            ),
            Err(e) => warn!(filename, error = %e, "Document processing failed"),
        }
        result
    }

    async fn run_stages(
        &self,
        filename: &str,
        path: &std::path::Path,
    ) -> Result<(ProcessedDocument, StageTimings), PipelineError> {
        let mut timings = StageTimings::default();

        let stage = Instant::now();
        let text = self.extractor.extract(path).await?;
        timings.extract = stage.elapsed();
        info!(
            filename,
            chars = text.chars().count(),
            elapsed_ms = timings.extract.as_millis() as u64,
            "Text extracted"
        );

        let stage = Instant::now();
        let entities = self.tagger.tag(&text).await?;
        timings.tag = stage.elapsed();
        info!(
            filename,
            entities = entities.len(),
            engine = self.tagger.engine().name(),
            elapsed_ms = timings.tag.as_millis() as u64,
            "Entities tagged"
        );

        let stage = Instant::now();
        let validated = self.rules.validate(&entities);
        timings.validate = stage.elapsed();
        let record = ProcessedDocument::assemble(filename, &text, entities, validated);

        let stage = Instant::now();
        self.store.put(&record).await?;
        timings.store = stage.elapsed();
        Ok((record, timings))
    }
}
