use rustc_hash::FxHashMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::classifier::ClassifierComparison;
use crate::error::Diagnostic;
use crate::evaluator::{EvaluationResult, RuleDetail};
use crate::features::FeatureCode;
use crate::join::WideTable;

/// A count over a count; zero denominators are "not applicable"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Share {
    pub numerator: usize,
    pub denominator: usize,
}

impl Share {
    pub fn new(numerator: usize, denominator: usize) -> Self {
        Share {
            numerator,
            denominator,
        }
    }

    pub fn is_applicable(&self) -> bool {
        self.denominator > 0
    }

    pub fn fraction(&self) -> Option<f64> {
        self.is_applicable()
            .then(|| self.numerator as f64 / self.denominator as f64)
    }

    pub fn percent(&self) -> Option<f64> {
        self.fraction().map(|f| f * 100.0)
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(pct) => write!(f, "{:.1}%", pct),
            None => f.write_str("not applicable"),
        }
    }
}

impl Serialize for Share {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Share", 3)?;
        s.serialize_field("numerator", &self.numerator)?;
        s.serialize_field("denominator", &self.denominator)?;
        s.serialize_field("percent", &self.percent())?;
        s.end()
    }
}

/// Cross-tabulation of two features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub title: String,
    pub row_feature: FeatureCode,
    pub column_feature: FeatureCode,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// Languages left out because either value was missing or unlabelled
    pub excluded: usize,
}

impl ContingencyTable {
    /// Count languages by (row label, column label)
    ///
    /// The label functions map a raw feature value to its table label;
    /// returning `None` excludes the language.
    pub fn build<R, C>(
        title: impl Into<String>,
        table: &WideTable,
        row_feature: FeatureCode,
        row_label: R,
        column_feature: FeatureCode,
        column_label: C,
    ) -> Self
    where
        R: Fn(&str) -> Option<String>,
        C: Fn(&str) -> Option<String>,
    {
        let mut counts: FxHashMap<(String, String), usize> = FxHashMap::default();
        let mut excluded = 0;

        for record in table.iter() {
            let row = record.value(row_feature).and_then(&row_label);
            let col = record.value(column_feature).and_then(&column_label);
            match (row, col) {
                (Some(r), Some(c)) => *counts.entry((r, c)).or_insert(0) += 1,
                _ => excluded += 1,
            }
        }

        let mut out = Self::from_counts(title, row_feature, column_feature, counts);
        out.excluded = excluded;
        out
    }

    pub fn from_counts(
        title: impl Into<String>,
        row_feature: FeatureCode,
        column_feature: FeatureCode,
        counts: impl IntoIterator<Item = ((String, String), usize)>,
    ) -> Self {
        let mut nested: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut columns: BTreeSet<String> = BTreeSet::new();
        for ((row, col), n) in counts {
            columns.insert(col.clone());
            *nested.entry(row).or_default().entry(col).or_insert(0) += n;
        }

        ContingencyTable {
            title: title.into(),
            row_feature,
            column_feature,
            rows: nested.keys().cloned().collect(),
            columns: columns.into_iter().collect(),
            counts: nested,
            excluded: 0,
        }
    }

    /// Merge rows under new labels (e.g. SVO/VSO/VOS → VO); `None` drops a row
    pub fn regroup_rows(&self, title: impl Into<String>, group: impl Fn(&str) -> Option<String>) -> Self {
        let mut counts: FxHashMap<(String, String), usize> = FxHashMap::default();
        let mut dropped = 0;
        for (row, cols) in &self.counts {
            match group(row) {
                Some(label) => {
                    for (col, n) in cols {
                        *counts.entry((label.clone(), col.clone())).or_insert(0) += n;
                    }
                }
                None => dropped += cols.values().sum::<usize>(),
            }
        }
        let mut out = Self::from_counts(title, self.row_feature, self.column_feature, counts);
        out.excluded = self.excluded + dropped;
        out
    }

    pub fn count(&self, row: &str, column: &str) -> usize {
        self.counts
            .get(row)
            .and_then(|cols| cols.get(column))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_total(&self, row: &str) -> usize {
        self.counts.get(row).map_or(0, |cols| cols.values().sum())
    }

    pub fn column_total(&self, column: &str) -> usize {
        self.counts.values().filter_map(|cols| cols.get(column)).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.values().flat_map(|cols| cols.values()).sum()
    }

    /// Share of `column` within `row`, restricted to the columns in `among`
    /// (all columns when `among` is empty)
    pub fn share(&self, row: &str, column: &str, among: &[&str]) -> Share {
        let denominator = if among.is_empty() {
            self.row_total(row)
        } else {
            among.iter().map(|c| self.count(row, c)).sum()
        };
        Share::new(self.count(row, column), denominator)
    }
}

/// Languages with a value for one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCoverage {
    pub feature: FeatureCode,
    pub wals_id: &'static str,
    pub title: &'static str,
    pub covered: usize,
    pub share: Share,
}

impl FeatureCoverage {
    pub fn for_table(table: &WideTable) -> Vec<Self> {
        table
            .features
            .iter()
            .map(|&feature| {
                let covered = table.coverage(feature);
                FeatureCoverage {
                    feature,
                    wals_id: feature.wals_id(),
                    title: feature.title(),
                    covered,
                    share: Share::new(covered, table.len()),
                }
            })
            .collect()
    }
}

/// Everything one analysis run produced, ready for a formatter
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub languages: usize,
    pub features: Vec<FeatureCoverage>,
    pub evaluations: Vec<EvaluationResult>,
    pub rule_details: Vec<RuleDetail>,
    pub contingency_tables: Vec<ContingencyTable>,
    pub classifier: Option<ClassifierComparison>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::LanguageRecord;

    fn raw_order_by_adposition() -> ContingencyTable {
        let counts = [
            ("SVO", "Prepositions", 326),
            ("VSO", "Prepositions", 96),
            ("VOS", "Prepositions", 39),
            ("SVO", "Postpositions", 46),
            ("VSO", "Postpositions", 6),
            ("VOS", "Postpositions", 0),
            ("SOV", "Postpositions", 472),
            ("SOV", "Prepositions", 14),
            ("SVO", "Inpositions", 3),
        ];
        ContingencyTable::from_counts(
            "Word order by adposition",
            FeatureCode::WordOrder,
            FeatureCode::AdpositionOrder,
            counts
                .iter()
                .map(|(r, c, n)| ((r.to_string(), c.to_string()), *n)),
        )
    }

    #[test]
    fn test_share_display() {
        assert_eq!(Share::new(461, 513).to_string(), "89.9%");
        assert_eq!(Share::new(0, 0).to_string(), "not applicable");
        assert_eq!(Share::new(0, 0).percent(), None);
        assert_eq!(Share::new(1, 4).fraction(), Some(0.25));
    }

    #[test]
    fn test_share_serializes_percent() {
        let json = serde_json::to_value(Share::new(0, 0)).unwrap();
        assert_eq!(json["percent"], serde_json::Value::Null);
        let json = serde_json::to_value(Share::new(1, 2)).unwrap();
        assert_eq!(json["percent"], serde_json::json!(50.0));
    }

    #[test]
    fn test_vo_adposition_share() {
        let vo = raw_order_by_adposition().regroup_rows("VO/OV by adposition", |order| {
            crate::features::BasicOrder::from_label(order)
                .and_then(|o| o.verb_object())
                .map(|vo| vo.label().to_string())
        });

        assert_eq!(vo.count("VO", "Prepositions"), 461);
        assert_eq!(vo.count("VO", "Postpositions"), 52);
        assert_eq!(vo.count("OV", "Postpositions"), 472);

        let share = vo.share("VO", "Prepositions", &["Prepositions", "Postpositions"]);
        assert_eq!(share, Share::new(461, 513));
        approx::assert_relative_eq!(share.percent().unwrap(), 89.863_547, epsilon = 1e-4);
        assert_eq!(share.to_string(), "89.9%");

        // Inpositions count toward the row total when no subset is given
        assert_eq!(vo.share("VO", "Prepositions", &[]).denominator, 516);
    }

    #[test]
    fn test_share_of_missing_row_is_not_applicable() {
        let table = raw_order_by_adposition();
        assert_eq!(table.share("OSV", "Postpositions", &[]).to_string(), "not applicable");
    }

    #[test]
    fn test_build_excludes_missing_values() {
        let wide = WideTable {
            features: vec![FeatureCode::WordOrder, FeatureCode::AdpositionOrder],
            records: vec![
                LanguageRecord::new("a")
                    .with_feature(FeatureCode::WordOrder, Some("SVO"))
                    .with_feature(FeatureCode::AdpositionOrder, Some("Prepositions")),
                LanguageRecord::new("b")
                    .with_feature(FeatureCode::WordOrder, Some("SVO"))
                    .with_feature(FeatureCode::AdpositionOrder, None),
                LanguageRecord::new("c")
                    .with_feature(FeatureCode::WordOrder, Some("SOV"))
                    .with_feature(FeatureCode::AdpositionOrder, Some("Postpositions")),
            ],
        };

        let identity = |v: &str| Some(v.to_string());
        let table = ContingencyTable::build(
            "t",
            &wide,
            FeatureCode::WordOrder,
            identity,
            FeatureCode::AdpositionOrder,
            identity,
        );
        assert_eq!(table.total(), 2);
        assert_eq!(table.excluded, 1);
        assert_eq!(table.rows, vec!["SOV", "SVO"]);
        assert_eq!(table.column_total("Prepositions"), 1);
    }
}
