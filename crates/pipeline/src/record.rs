use extract::Entity;
use serde::{Deserialize, Serialize};
use validate::{ValidatedEntity, ValidationSummary};

/// Characters of extracted text kept in a stored result.
pub const PREVIEW_CHARS: usize = 500;

/// The outcome of one pipeline run, as returned and as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub filename: String,
    /// Preview of the extracted text, truncated at write time
    pub raw_text: String,
    pub entities: Vec<Entity>,
    pub validated: Vec<ValidatedEntity>,
}

impl ProcessedDocument {
    pub fn assemble(
        filename: &str,
        text: &str,
        entities: Vec<Entity>,
        validated: Vec<ValidatedEntity>,
    ) -> Self {
        Self {
            filename: filename.to_string(),
            raw_text: preview(text),
            entities,
            validated,
        }
    }

    pub fn summary(&self) -> ValidationSummary {
        validate::summarize(&self.validated)
    }
}

/// First `PREVIEW_CHARS` characters of `text`.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
