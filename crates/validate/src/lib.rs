pub mod rules;

pub use rules::{Rule, RuleRegistry};

use extract::Entity;
use serde::{Deserialize, Serialize};

/// Outcome of a rule check, serialized as `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Validity {
    Valid,
    Invalid,
    /// No rule registered for the label
    #[default]
    Unknown,
}

impl From<bool> for Validity {
    fn from(valid: bool) -> Self {
        if valid { Validity::Valid } else { Validity::Invalid }
    }
}

impl From<Option<bool>> for Validity {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Validity::Unknown, Validity::from)
    }
}

impl From<Validity> for Option<bool> {
    fn from(value: Validity) -> Self {
        match value {
            Validity::Valid => Some(true),
            Validity::Invalid => Some(false),
            Validity::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedEntity {
    pub text: String,
    pub label: String,
    #[serde(default)]
    pub valid: Validity,
}

/// Verdict counts over a validated entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_entities: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unknown: usize,
}

/// Validate with the standard rules.
pub fn validate(entities: &[Entity]) -> Vec<ValidatedEntity> {
    RuleRegistry::standard().validate(entities)
}

pub fn summarize(validated: &[ValidatedEntity]) -> ValidationSummary {
    validated
        .iter()
        .fold(ValidationSummary::default(), |mut summary, entity| {
            summary.total_entities += 1;
            match entity.valid {
                Validity::Valid => summary.valid += 1,
                Validity::Invalid => summary.invalid += 1,
                Validity::Unknown => summary.unknown += 1,
            }
            summary
        })
}
