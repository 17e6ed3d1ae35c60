pub mod engine;
pub mod llm;
pub mod normalizer;
pub mod patterns;
pub mod prompt;
pub mod schema;

pub use engine::{EntityRecognitionEngine, TaggingError};
pub use llm::OllamaClient;
pub use normalizer::EntityNormalizer;
pub use patterns::PatternRecognizer;
pub use schema::{Entity, RecognitionResponse};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

/// Number of attempts to get parseable JSON out of the model
const JSON_ATTEMPTS: usize = 3;

/// Entity recognition backed by an Ollama-served language model.
pub struct OllamaRecognizer {
    llm_client: OllamaClient,
}

impl OllamaRecognizer {
    pub fn new(llm_client: OllamaClient) -> Self {
        Self { llm_client }
    }
}

/// Parse the model's JSON answer into entities, keeping its order.
pub fn parse_recognition(json: &str) -> Result<Vec<Entity>, TaggingError> {
    let response: RecognitionResponse = serde_json::from_str(json)
        .map_err(|e| TaggingError::InvalidResponse(e.to_string()))?;
    Ok(response.entities)
}

#[async_trait]
impl EntityRecognitionEngine for OllamaRecognizer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, TaggingError> {
        let prompt = prompt::build_recognition_prompt(text);

        let json_str = self
            .llm_client
            .generate_json(&prompt, JSON_ATTEMPTS)
            .await
            .map_err(|e| TaggingError::Unavailable(format!("{e:#}")))?;

        parse_recognition(&json_str)
    }

    async fn ping(&self) -> Result<(), TaggingError> {
        self.llm_client
            .ping()
            .await
            .map_err(|e| TaggingError::Unavailable(format!("{e:#}")))
    }
}

/// Tags raw text with entities through a recognition engine.
#[derive(Clone)]
pub struct EntityTagger {
    engine: Arc<dyn EntityRecognitionEngine>,
    normalizer: Arc<EntityNormalizer>,
}

impl EntityTagger {
    pub fn new(engine: Arc<dyn EntityRecognitionEngine>) -> Self {
        Self {
            engine,
            normalizer: Arc::new(EntityNormalizer::new()),
        }
    }

    pub fn engine(&self) -> &Arc<dyn EntityRecognitionEngine> {
        &self.engine
    }

    /// Tag `text`. Blank text yields no entities without calling the engine.
    pub async fn tag(&self, text: &str) -> Result<Vec<Entity>, TaggingError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let raw = self.engine.recognize(text).await?;
        let entities = self.normalizer.normalize_all(raw);

        debug!(engine = self.engine.name(), entities = entities.len(), "Text tagged");
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedEngine {
        entities: Vec<Entity>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EntityRecognitionEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>, TaggingError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.entities.clone())
        }
    }

    #[tokio::test]
    async fn test_tag_preserves_model_order() {
        let engine = Arc::new(ScriptedEngine {
            entities: vec![
                Entity::new("Acme Corp", "org"),
                Entity::new("250.00", "MONEY"),
                Entity::new("Acme Corp", "ORG"),
            ],
            calls: AtomicUsize::new(0),
        });
        let tagger = EntityTagger::new(engine.clone());

        let entities = tagger.tag("Acme Corp owes 250.00. Acme Corp.").await.unwrap();

        assert_eq!(
            entities,
            vec![
                Entity::new("Acme Corp", "ORG"),
                Entity::new("250.00", "MONEY"),
                Entity::new("Acme Corp", "ORG"),
            ]
        );
        assert_eq!(engine.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_blank_text_skips_engine() {
        let engine = Arc::new(ScriptedEngine {
            entities: vec![Entity::new("x", "PERSON")],
            calls: AtomicUsize::new(0),
        });
        let tagger = EntityTagger::new(engine.clone());

        assert!(tagger.tag("  \n\t").await.unwrap().is_empty());
        assert!(tagger.tag("").await.unwrap().is_empty());
        assert_eq!(engine.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_parse_recognition_accepts_aliases() {
        let json = r#"{"entities": [
            {"text": "2023-05-01", "label": "DATE"},
            {"name": "Jane Doe", "type": "PERSON"}
        ]}"#;

        let entities = parse_recognition(json).unwrap();
        assert_eq!(
            entities,
            vec![Entity::new("2023-05-01", "DATE"), Entity::new("Jane Doe", "PERSON")]
        );
    }

    #[test]
    fn test_parse_recognition_missing_entities_is_empty() {
        assert!(parse_recognition("{}").unwrap().is_empty());
        assert!(matches!(
            parse_recognition(r#"{"entities": "nope"}"#),
            Err(TaggingError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_unavailable() {
        let client = OllamaClient::new(
            "http://127.0.0.1:9".to_string(),
            "llama3".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        let recognizer = OllamaRecognizer::new(client);

        let err = recognizer.recognize("Paid $10 on 2024-01-01").await.unwrap_err();
        assert!(matches!(err, TaggingError::Unavailable(_)));
        assert!(recognizer.ping().await.is_err());
    }
}
