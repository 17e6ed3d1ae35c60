use pipeline::StageTimings;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_process_time_us: AtomicU64,
    total_extract_time_us: AtomicU64,
    total_tag_time_us: AtomicU64,
    total_validate_time_us: AtomicU64,
    total_store_time_us: AtomicU64,

    // Counts
    documents_processed: AtomicUsize,
    total_entities_tagged: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_process_time_us: AtomicU64::new(0),
            total_extract_time_us: AtomicU64::new(0),
            total_tag_time_us: AtomicU64::new(0),
            total_validate_time_us: AtomicU64::new(0),
            total_store_time_us: AtomicU64::new(0),
            documents_processed: AtomicUsize::new(0),
            total_entities_tagged: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_document(&self, duration: Duration, stages: &StageTimings, entities: usize) {
        add_micros(&self.total_process_time_us, duration);
        add_micros(&self.total_extract_time_us, stages.extract);
        add_micros(&self.total_tag_time_us, stages.tag);
        add_micros(&self.total_validate_time_us, stages.validate);
        add_micros(&self.total_store_time_us, stages.store);
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.total_entities_tagged.fetch_add(entities, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let documents = self.documents_processed.load(Ordering::Relaxed);
        let avg_ms = |total_us: &AtomicU64| {
            if documents > 0 {
                total_us.load(Ordering::Relaxed) as f64 / documents as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            documents_processed: documents,
            total_entities_tagged: self.total_entities_tagged.load(Ordering::Relaxed),
            avg_process_time_ms: avg_ms(&self.total_process_time_us),
            avg_extract_time_ms: avg_ms(&self.total_extract_time_us),
            avg_tag_time_ms: avg_ms(&self.total_tag_time_us),
            avg_validate_time_ms: avg_ms(&self.total_validate_time_us),
            avg_store_time_ms: avg_ms(&self.total_store_time_us),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub documents_processed: usize,
    pub total_entities_tagged: usize,
    pub avg_process_time_ms: f64,
    pub avg_extract_time_ms: f64,
    pub avg_tag_time_ms: f64,
    pub avg_validate_time_ms: f64,
    pub avg_store_time_ms: f64,
}

fn add_micros(total: &AtomicU64, duration: Duration) {
    total.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
