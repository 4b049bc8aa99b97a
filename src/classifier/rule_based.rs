//! Word-order baseline for adposition prediction
//!
//! VO languages are predicted prepositional and OV languages postpositional
//! (Universals 3 and 4 read as a classifier). Rows without a usable order
//! get the training majority class.

use std::collections::BTreeMap;

use super::dataset::{majority, MISSING_TOKEN};
use super::Classifier;
use crate::features::{Adposition, FeatureCode, VerbObject};
use crate::join::LanguageRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct WordOrderRule {
    pub fallback: String,
}

impl WordOrderRule {
    pub fn fit(train: &[&LanguageRecord], target: FeatureCode) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in train {
            if let Some(label) = record.value(target) {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        WordOrderRule {
            fallback: majority(&counts).unwrap_or(MISSING_TOKEN).to_string(),
        }
    }
}

impl Classifier for WordOrderRule {
    fn name(&self) -> &'static str {
        "word-order rule"
    }

    fn predict(&self, record: &LanguageRecord) -> String {
        match record.word_order().and_then(|o| o.verb_object()) {
            Some(VerbObject::Vo) => Adposition::Prepositions.label().to_string(),
            Some(VerbObject::Ov) => Adposition::Postpositions.label().to_string(),
            None => self.fallback.clone(),
        }
    }
}
