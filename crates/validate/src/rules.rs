use std::collections::HashMap;

use extract::Entity;

use crate::{ValidatedEntity, Validity};

/// Predicate over an entity's text.
pub type Rule = fn(&str) -> bool;

/// Label -> rule mapping. Labels without a rule validate as `Unknown`.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Rule>,
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The `DATE` and `MONEY` rules.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule("DATE", date_rule)
            .with_rule("MONEY", money_rule)
    }

    pub fn with_rule(mut self, label: &str, rule: Rule) -> Self {
        self.rules.insert(label.to_string(), rule);
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn check(&self, entity: &Entity) -> Validity {
        match self.rules.get(&entity.label) {
            Some(rule) => rule(&entity.text).into(),
            None => Validity::Unknown,
        }
    }

    /// One verdict per entity, same order.
    pub fn validate(&self, entities: &[Entity]) -> Vec<ValidatedEntity> {
        entities
            .iter()
            .map(|entity| ValidatedEntity {
                text: entity.text.clone(),
                label: entity.label.clone(),
                valid: self.check(entity),
            })
            .collect()
    }
}

/// At least six characters. A length heuristic, not a date parse.
pub fn date_rule(text: &str) -> bool {
    text.chars().count() >= 6
}

/// A non-negative numeral: ASCII digits with at most one decimal point.
/// No sign, currency symbol or thousands separator. Empty text is invalid.
pub fn money_rule(text: &str) -> bool {
    let digits = text.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(text: &str, label: &str) -> Validity {
        RuleRegistry::standard().check(&Entity::new(text, label))
    }

    #[test]
    fn test_money_rule() {
        assert_eq!(verdict("123.45", "MONEY"), Validity::Valid);
        assert_eq!(verdict("100", "MONEY"), Validity::Valid);
        assert_eq!(verdict("12.3.4", "MONEY"), Validity::Invalid);
        assert_eq!(verdict("abc", "MONEY"), Validity::Invalid);
    }

    #[test]
    fn test_money_rule_rejects_decorations() {
        for text in ["$250.00", "1,250.00", "-5", "+5", " 5", "250 USD"] {
            assert_eq!(verdict(text, "MONEY"), Validity::Invalid, "{text:?}");
        }
        // a single point may sit at either end
        assert_eq!(verdict("12.", "MONEY"), Validity::Valid);
        assert_eq!(verdict(".5", "MONEY"), Validity::Valid);
    }

    #[test]
    fn test_money_rule_empty_is_invalid() {
        assert_eq!(verdict("", "MONEY"), Validity::Invalid);
        assert_eq!(verdict(".", "MONEY"), Validity::Invalid);
    }

    #[test]
    fn test_date_rule() {
        assert_eq!(verdict("2024", "DATE"), Validity::Invalid);
        assert_eq!(verdict("2024-01", "DATE"), Validity::Valid);
        assert_eq!(verdict("May 01", "DATE"), Validity::Valid);
        assert_eq!(verdict("abcdef", "DATE"), Validity::Valid);
    }

    #[test]
    fn test_date_rule_counts_characters_not_bytes() {
        // five characters, ten bytes
        assert_eq!(verdict("ééééé", "DATE"), Validity::Invalid);
    }

    #[test]
    fn test_unregistered_label_is_unknown() {
        for text in ["Jane Doe", "", "123.45", "2024-01-01"] {
            assert_eq!(verdict(text, "PERSON"), Validity::Unknown);
        }
        // labels match exactly
        assert_eq!(verdict("100", "money"), Validity::Unknown);
    }

    #[test]
    fn test_custom_rule() {
        let registry = RuleRegistry::empty().with_rule("PERCENT", |t| t.ends_with('%'));

        assert_eq!(registry.check(&Entity::new("15%", "PERCENT")), Validity::Valid);
        assert_eq!(registry.check(&Entity::new("100", "MONEY")), Validity::Unknown);
    }
}
