//! Greenberg universals as declarative rules
//!
//! Each rule lists the features it depends on and a pure predicate over a
//! single `LanguageRecord`. Rules are grouped by the clause domain they
//! talk about:
//! - `word_order`: rules conditioned on the order of verb and object
//! - `noun_phrase`: rules about modifiers inside the noun phrase

pub mod noun_phrase;
pub mod word_order;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::features::FeatureCode;
use crate::join::LanguageRecord;

/// Outcome of testing one language against one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NotApplicable,
    Satisfied,
    Violated,
}

impl Verdict {
    pub fn violated_if(violation: bool) -> Self {
        if violation {
            Verdict::Violated
        } else {
            Verdict::Satisfied
        }
    }
}

pub type Predicate = fn(&LanguageRecord) -> Verdict;

/// A Greenberg-style implicational universal
#[derive(Clone, Copy)]
pub struct UniversalRule {
    /// Greenberg's numeral, e.g. "23"
    pub id: &'static str,
    pub statement: &'static str,
    pub depends_on: &'static [FeatureCode],
    pub predicate: Predicate,
}

impl fmt::Debug for UniversalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniversalRule")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

impl UniversalRule {
    /// Dependent features with no value for this language
    pub fn missing_features(&self, record: &LanguageRecord) -> SmallVec<[FeatureCode; 4]> {
        self.depends_on
            .iter()
            .copied()
            .filter(|&code| !record.has(code))
            .collect()
    }

    /// Dependent features whose value none of the typed views can read
    pub fn unrecognized_features(&self, record: &LanguageRecord) -> SmallVec<[FeatureCode; 4]> {
        self.depends_on
            .iter()
            .copied()
            .filter(|&code| record.value(code).is_some_and(|v| !code.recognizes(v)))
            .collect()
    }

    /// Applicability check followed by the predicate
    ///
    /// A language missing any dependent feature, or carrying a label that
    /// cannot be interpreted, is never evaluated, so it can never count as a
    /// violation.
    pub fn check(&self, record: &LanguageRecord) -> RuleCheck {
        let missing = self.missing_features(record);
        if !missing.is_empty() {
            return RuleCheck::MissingData(missing);
        }
        let unrecognized = self.unrecognized_features(record);
        if !unrecognized.is_empty() {
            return RuleCheck::Unrecognized(unrecognized);
        }
        RuleCheck::Evaluated((self.predicate)(record))
    }
}

/// Result of `UniversalRule::check`
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    MissingData(SmallVec<[FeatureCode; 4]>),
    Unrecognized(SmallVec<[FeatureCode; 4]>),
    Evaluated(Verdict),
}

impl RuleCheck {
    pub fn verdict(&self) -> Verdict {
        match self {
            RuleCheck::MissingData(_) | RuleCheck::Unrecognized(_) => Verdict::NotApplicable,
            RuleCheck::Evaluated(v) => *v,
        }
    }
}

/// Every rule, in Greenberg order
pub fn all_rules() -> Vec<UniversalRule> {
    let mut rules: Vec<UniversalRule> = word_order::RULES
        .iter()
        .chain(noun_phrase::RULES.iter())
        .copied()
        .collect();
    rules.sort_by_key(|r| r.id.parse::<u32>().unwrap_or(u32::MAX));
    rules
}

pub fn find_rule(id: &str) -> Option<UniversalRule> {
    all_rules().into_iter().find(|r| r.id == id)
}
