use serde::{Deserialize, Serialize};

/// A tagged span of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(alias = "name")]
    pub text: String,
    #[serde(alias = "type", alias = "entity_type")]
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// JSON shape requested from the recognition model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResponse {
    #[serde(default)]
    pub entities: Vec<Entity>,
}
