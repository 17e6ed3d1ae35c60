//! Regex-based recognizer for dates and currency amounts.
//!
//! Deterministic and offline: useful where no model server is available and
//! as a stand-in for the model in tests.

use async_trait::async_trait;
use regex::Regex;

use crate::engine::{EntityRecognitionEngine, TaggingError};
use crate::schema::Entity;

const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?";

pub struct PatternRecognizer {
    date: Regex,
    money: Regex,
}

impl PatternRecognizer {
    pub fn new() -> Self {
        let date = format!(
            r"(?i)\b(?:\d{{4}}-\d{{1,2}}-\d{{1,2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|{MONTH}\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}|\d{{1,2}}\s+{MONTH}\s+\d{{4}})\b"
        );
        // The amount is captured without its currency marker
        let money = r"(?i)(?:[$€£¥]\s?(\d[\d,]*(?:\.\d+)?))|(?:\b(\d[\d,]*(?:\.\d+)?)\s?(?:usd|eur|gbp|dollars?|euros?)\b)";

        Self {
            date: Regex::new(&date).unwrap(),
            money: Regex::new(money).unwrap(),
        }
    }

    /// Spans sorted by position; a MONEY match overlapping a DATE is dropped.
    pub fn find_entities(&self, text: &str) -> Vec<Entity> {
        let mut spans: Vec<(usize, usize, &str)> = self
            .date
            .find_iter(text)
            .map(|m| (m.start(), m.end(), "DATE"))
            .collect();

        for caps in self.money.captures_iter(text) {
            let Some(amount) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let overlaps = spans
                .iter()
                .any(|&(start, end, _)| amount.start() < end && start < amount.end());
            if !overlaps {
                spans.push((amount.start(), amount.end(), "MONEY"));
            }
        }

        spans.sort_by_key(|&(start, _, _)| start);
        spans
            .into_iter()
            .map(|(start, end, label)| Entity::new(&text[start..end], label))
            .collect()
    }
}

impl Default for PatternRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityRecognitionEngine for PatternRecognizer {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, TaggingError> {
        Ok(self.find_entities(text))
    }
}
