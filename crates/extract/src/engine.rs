use async_trait::async_trait;
use thiserror::Error;

use crate::schema::Entity;

#[derive(Error, Debug)]
pub enum TaggingError {
    #[error("Entity recognition backend unavailable: {0}")]
    Unavailable(String),

    #[error("Entity recognition returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Named-entity recognition capability.
///
/// Implementations return spans in the order the model produced them.
#[async_trait]
pub trait EntityRecognitionEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, TaggingError>;

    async fn ping(&self) -> Result<(), TaggingError> {
        Ok(())
    }
}
