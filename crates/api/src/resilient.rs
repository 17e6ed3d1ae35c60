use std::sync::Arc;

use async_trait::async_trait;
use extract::{Entity, EntityRecognitionEngine, TaggingError};
use tracing::debug;

use crate::cache::RecognitionCache;
use crate::retry::RetryPolicy;

/// Wraps a recognition backend with retries on transient failures and an
/// optional cache of earlier answers.
pub struct ResilientRecognizer {
    inner: Arc<dyn EntityRecognitionEngine>,
    retry: RetryPolicy,
    cache: Option<Arc<RecognitionCache>>,
}

impl ResilientRecognizer {
    pub fn new(
        inner: Arc<dyn EntityRecognitionEngine>,
        retry: RetryPolicy,
        cache: Option<Arc<RecognitionCache>>,
    ) -> Self {
        Self { inner, retry, cache }
    }
}

#[async_trait]
impl EntityRecognitionEngine for ResilientRecognizer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, TaggingError> {
        if let Some(entities) = self.cache.as_ref().and_then(|c| c.get(text)) {
            debug!(engine = self.inner.name(), "Recognition cache hit");
            return Ok(entities);
        }

        let entities = self
            .retry
            .retry_if(
                "entity_recognition",
                || self.inner.recognize(text),
                |e| matches!(e, TaggingError::Unavailable(_)),
            )
            .await?;

        if let Some(cache) = &self.cache {
            cache.insert(text, entities.clone());
        }
        Ok(entities)
    }

    async fn ping(&self) -> Result<(), TaggingError> {
        self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with the given error for the first `failures` calls.
    struct Flaky {
        failures: usize,
        permanent: bool,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(failures: usize, permanent: bool) -> Self {
            Self {
                failures,
                permanent,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EntityRecognitionEngine for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn recognize(&self, text: &str) -> Result<Vec<Entity>, TaggingError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(if self.permanent {
                    TaggingError::InvalidResponse("not json".to_string())
                } else {
                    TaggingError::Unavailable("connection reset".to_string())
                });
            }
            Ok(vec![Entity::new(text, "ORG")])
        }
    }

    #[tokio::test]
    async fn test_retries_unavailable_backend() {
        let inner = Arc::new(Flaky::new(2, false));
        let recognizer = ResilientRecognizer::new(inner.clone(), RetryPolicy::new(3, 1, 2), None);

        let entities = recognizer.recognize("Acme").await.unwrap();

        assert_eq!(entities, vec![Entity::new("Acme", "ORG")]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_response_fails_fast() {
        let inner = Arc::new(Flaky::new(1, true));
        let recognizer = ResilientRecognizer::new(inner.clone(), RetryPolicy::new(3, 1, 2), None);

        let err = recognizer.recognize("Acme").await.unwrap_err();

        assert!(matches!(err, TaggingError::InvalidResponse(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_backend_for_repeated_text() {
        let inner = Arc::new(Flaky::new(0, false));
        let cache = Arc::new(RecognitionCache::new(16));
        let recognizer =
            ResilientRecognizer::new(inner.clone(), RetryPolicy::new(0, 0, 0), Some(cache.clone()));

        let first = recognizer.recognize("Acme").await.unwrap();
        let second = recognizer.recognize("Acme").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(Flaky::new(1, false));
        let cache = Arc::new(RecognitionCache::new(16));
        let recognizer =
            ResilientRecognizer::new(inner.clone(), RetryPolicy::new(0, 0, 0), Some(cache.clone()));

        assert!(recognizer.recognize("Acme").await.is_err());
        assert!(recognizer.recognize("Acme").await.is_ok());
        assert_eq!(cache.stats().entries, 1);
    }
}
