use regex::Regex;
use std::collections::HashMap;

use crate::schema::Entity;

pub struct EntityNormalizer {
    /// Maps label variants -> canonical label
    aliases: HashMap<&'static str, &'static str>,
    whitespace: Regex,
}

impl EntityNormalizer {
    pub fn new() -> Self {
        let aliases = HashMap::from([
            ("ORGANIZATION", "ORG"),
            ("ORGANISATION", "ORG"),
            ("LOCATION", "LOC"),
            ("PER", "PERSON"),
            ("PEOPLE", "PERSON"),
        ]);

        Self {
            aliases,
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Map raw model output onto the entity shape: collapse whitespace in the
    /// span, upper-case the label and resolve label aliases. Spans that end up
    /// empty are dropped. Order is preserved.
    pub fn normalize_all(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
            .into_iter()
            .filter_map(|entity| self.normalize(entity))
            .collect()
    }

    pub fn normalize(&self, entity: Entity) -> Option<Entity> {
        let text = self.whitespace.replace_all(entity.text.trim(), " ").to_string();
        let label = self.normalize_label(&entity.label);

        if text.is_empty() || label.is_empty() {
            return None;
        }
        Some(Entity { text, label })
    }

    pub fn normalize_label(&self, label: &str) -> String {
        let upper = label.trim().to_uppercase().replace([' ', '-'], "_");
        match self.aliases.get(upper.as_str()) {
            Some(canonical) => canonical.to_string(),
            None => upper,
        }
    }
}

impl Default for EntityNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let normalizer = EntityNormalizer::new();

        let entity = normalizer.normalize(Entity::new("  May  1,\n2023 ", "date")).unwrap();
        assert_eq!(entity, Entity::new("May 1, 2023", "DATE"));
    }

    #[test]
    fn test_alias_resolution() {
        let normalizer = EntityNormalizer::new();

        assert_eq!(normalizer.normalize_label("Organization"), "ORG");
        assert_eq!(normalizer.normalize_label("work of art"), "WORK_OF_ART");
        assert_eq!(normalizer.normalize_label("MONEY"), "MONEY");
    }

    #[test]
    fn test_empty_spans_dropped_order_kept() {
        let normalizer = EntityNormalizer::new();
        let out = normalizer.normalize_all(vec![
            Entity::new("250.00", "MONEY"),
            Entity::new("   ", "DATE"),
            Entity::new("Acme", ""),
            Entity::new("250.00", "MONEY"),
        ]);

        assert_eq!(
            out,
            vec![Entity::new("250.00", "MONEY"), Entity::new("250.00", "MONEY")]
        );
    }
}
