//! Row selection, reproducible train/test split and imputation
//!
//! Policy:
//! - rows whose target value is missing are excluded
//! - missing predictor values are filled with the training-split mode
//!   (ties → lexicographically smallest label)

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::warn;

use crate::features::FeatureCode;
use crate::join::{LanguageRecord, WideTable};

/// Filler for a predictor that has no value anywhere in training
pub const MISSING_TOKEN: &str = "<missing>";

/// Labelled rows for one target column
#[derive(Debug, Clone)]
pub struct Dataset<'a> {
    pub target: FeatureCode,
    pub predictors: Vec<FeatureCode>,
    /// Rows with a target value, in table (language id) order
    pub rows: Vec<&'a LanguageRecord>,
    /// Rows dropped for a missing target
    pub excluded: usize,
}

impl<'a> Dataset<'a> {
    /// Select labelled rows; the target is never kept as a predictor
    pub fn from_table(table: &'a WideTable, target: FeatureCode, predictors: &[FeatureCode]) -> Self {
        if predictors.contains(&target) {
            warn!("Target {} removed from the predictor list", target);
        }
        let mut kept: Vec<FeatureCode> = Vec::with_capacity(predictors.len());
        for &p in predictors {
            if p != target && !kept.contains(&p) {
                kept.push(p);
            }
        }

        let rows: Vec<&LanguageRecord> = table.iter().filter(|r| r.has(target)).collect();
        let excluded = table.len() - rows.len();

        Dataset {
            target,
            predictors: kept,
            rows,
            excluded,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn label(&self, record: &LanguageRecord) -> String {
        record.value(self.target).unwrap_or(MISSING_TOKEN).to_string()
    }

    /// Shuffle with a fixed seed and cut into (train, test)
    ///
    /// Train receives `round(n * (1 - test_fraction))` rows, at least one.
    pub fn split(&self, test_fraction: f64, seed: u64) -> (Vec<&'a LanguageRecord>, Vec<&'a LanguageRecord>) {
        let n = self.rows.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let train_len = ((n as f64) * (1.0 - test_fraction)).round() as usize;
        let train_len = train_len.clamp(n.min(1), n);

        let train = order[..train_len].iter().map(|&i| self.rows[i]).collect();
        let test = order[train_len..].iter().map(|&i| self.rows[i]).collect();
        (train, test)
    }
}

/// Mode imputation fitted on the training split
#[derive(Debug, Clone, PartialEq)]
pub struct Imputer {
    pub predictors: Vec<FeatureCode>,
    pub fill: Vec<String>,
}

impl Imputer {
    pub fn fit(predictors: &[FeatureCode], train: &[&LanguageRecord]) -> Self {
        let fill = predictors
            .iter()
            .map(|&code| {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for record in train {
                    if let Some(v) = record.value(code) {
                        *counts.entry(v).or_insert(0) += 1;
                    }
                }
                majority(&counts).unwrap_or(MISSING_TOKEN).to_string()
            })
            .collect();

        Imputer {
            predictors: predictors.to_vec(),
            fill,
        }
    }

    /// Predictor values of a record with gaps filled
    pub fn transform(&self, record: &LanguageRecord) -> Vec<String> {
        self.predictors
            .iter()
            .zip(&self.fill)
            .map(|(&code, fill)| record.value(code).unwrap_or(fill).to_string())
            .collect()
    }
}

/// Most frequent key; ties go to the smallest key
pub fn majority<'k>(counts: &BTreeMap<&'k str, usize>) -> Option<&'k str> {
    let mut best: Option<(&str, usize)> = None;
    for (&key, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}
