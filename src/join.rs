//! Joiner: per-feature tables → one wide table keyed by language id
//!
//! The result never depends on the order the feature tables are passed in:
//! columns follow `FeatureCode::ALL`, rows are sorted by language id, and the
//! left-join base is chosen by coverage with ties broken by feature code.

use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::data::{duplicate_diagnostics, FeatureTable, LanguageMeta, LanguageMetadata};
use crate::error::{Diagnostic, Result, WalsError};
use crate::features::{Adposition, BasicOrder, CaseBucket, FeatureCode, NounOrder};
use crate::utils::{
    column_names, find_column, read_delimited, require_column, string_values, write_frame,
};

/// How languages missing from some feature tables are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Keep every language of the broadest feature; other values may be absent
    #[default]
    Left,
    /// Keep only languages listed in every feature table
    Inner,
}

/// One language with its feature values
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRecord {
    pub id: String,
    /// One entry per wide-table column; `None` = no data for this language
    pub features: BTreeMap<FeatureCode, Option<String>>,
    pub meta: Option<LanguageMeta>,
}

impl LanguageRecord {
    pub fn new(id: impl Into<String>) -> Self {
        LanguageRecord {
            id: id.into(),
            features: BTreeMap::new(),
            meta: None,
        }
    }

    pub fn with_feature(mut self, code: FeatureCode, value: Option<&str>) -> Self {
        self.features.insert(code, value.map(str::to_string));
        self
    }

    pub fn value(&self, code: FeatureCode) -> Option<&str> {
        self.features.get(&code).and_then(|v| v.as_deref())
    }

    pub fn has(&self, code: FeatureCode) -> bool {
        self.value(code).is_some()
    }

    pub fn word_order(&self) -> Option<BasicOrder> {
        self.value(FeatureCode::WordOrder).and_then(BasicOrder::from_label)
    }

    pub fn adposition(&self) -> Option<Adposition> {
        self.value(FeatureCode::AdpositionOrder)
            .and_then(Adposition::from_label)
    }

    /// Prepositions or postpositions; mixed and other types give `None`
    pub fn dominant_adposition(&self) -> Option<Adposition> {
        self.adposition()
            .filter(|a| matches!(a, Adposition::Prepositions | Adposition::Postpositions))
    }

    pub fn noun_order(&self, code: FeatureCode) -> Option<NounOrder> {
        self.value(code).and_then(NounOrder::from_label)
    }

    pub fn case_bucket(&self) -> Option<CaseBucket> {
        self.value(FeatureCode::CaseCountBucket)
            .and_then(CaseBucket::from_label)
    }

    pub fn name(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.name.as_deref())
    }

    pub fn family(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.family.as_deref())
    }

    pub fn macro_area(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.macro_area.as_deref())
    }
}

/// Joined table: one row per language, one column per feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub features: Vec<FeatureCode>,
    pub records: Vec<LanguageRecord>,
}

const META_COLUMNS: [&str; 7] = [
    "language_id",
    "language_name",
    "family",
    "genus",
    "macro_area",
    "latitude",
    "longitude",
];

impl WideTable {
    /// Join per-feature tables on language id
    pub fn join(tables: &[FeatureTable], policy: JoinPolicy) -> Self {
        // Merge tables per feature; repeated features resolve by source path
        let mut sorted: Vec<&FeatureTable> = tables.iter().collect();
        sorted.sort_by(|a, b| (a.feature, &a.source).cmp(&(b.feature, &b.source)));

        let mut merged: BTreeMap<FeatureCode, BTreeMap<&str, Option<&str>>> = BTreeMap::new();
        for table in sorted {
            let column = merged.entry(table.feature).or_default();
            for (id, value) in &table.values {
                let slot = column.entry(id.as_str()).or_insert(None);
                if slot.is_none() {
                    *slot = value.as_deref();
                }
            }
        }

        let features: Vec<FeatureCode> = merged.keys().copied().collect();
        if features.is_empty() {
            return WideTable::default();
        }

        let keys: BTreeSet<&str> = match policy {
            JoinPolicy::Left => {
                let mut base = features[0];
                for &code in &features[1..] {
                    if merged[&code].len() > merged[&base].len() {
                        base = code;
                    }
                }
                debug!("Left join base: {} ({} languages)", base, merged[&base].len());
                merged[&base].keys().copied().collect()
            }
            JoinPolicy::Inner => {
                let mut columns = merged.values();
                let mut keys: BTreeSet<&str> = columns
                    .next()
                    .map(|c| c.keys().copied().collect())
                    .unwrap_or_default();
                for column in columns {
                    keys.retain(|id| column.contains_key(id));
                }
                keys
            }
        };

        let records = keys
            .into_iter()
            .map(|id| LanguageRecord {
                id: id.to_string(),
                features: features
                    .iter()
                    .map(|code| {
                        let value = merged[code]
                            .get(id)
                            .copied()
                            .flatten()
                            .map(str::to_string);
                        (*code, value)
                    })
                    .collect(),
                meta: None,
            })
            .collect::<Vec<_>>();

        info!(
            "Joined {} features into {} languages ({:?} join)",
            features.len(),
            records.len(),
            policy
        );

        WideTable { features, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageRecord> {
        self.records.iter()
    }

    pub fn get(&self, language_id: &str) -> Option<&LanguageRecord> {
        self.records
            .binary_search_by(|r| r.id.as_str().cmp(language_id))
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn has_feature(&self, code: FeatureCode) -> bool {
        self.features.contains(&code)
    }

    /// Languages with a value for `code`
    pub fn coverage(&self, code: FeatureCode) -> usize {
        self.records.iter().filter(|r| r.has(code)).count()
    }

    /// Attach name, family and macro-area; returns the number of matches
    pub fn attach_metadata(&mut self, metadata: &LanguageMetadata) -> usize {
        let mut matched = 0;
        for record in &mut self.records {
            record.meta = metadata.get(&record.id).cloned();
            if record.meta.is_some() {
                matched += 1;
            }
        }
        info!(
            "Language metadata attached to {}/{} languages",
            matched,
            self.records.len()
        );
        matched
    }

    /// Columnar form: metadata columns followed by the feature columns
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let meta_str = |f: fn(&LanguageMeta) -> Option<&String>| -> Vec<Option<String>> {
            self.records
                .iter()
                .map(|r| r.meta.as_ref().and_then(|m| f(m).cloned()))
                .collect()
        };
        let meta_f64 = |f: fn(&LanguageMeta) -> Option<f64>| -> Vec<Option<f64>> {
            self.records
                .iter()
                .map(|r| r.meta.as_ref().and_then(f))
                .collect()
        };

        let ids: Vec<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        let mut columns: Vec<Column> = vec![
            Series::new(META_COLUMNS[0].into(), ids).into(),
            Series::new(META_COLUMNS[1].into(), meta_str(|m| m.name.as_ref())).into(),
            Series::new(META_COLUMNS[2].into(), meta_str(|m| m.family.as_ref())).into(),
            Series::new(META_COLUMNS[3].into(), meta_str(|m| m.genus.as_ref())).into(),
            Series::new(META_COLUMNS[4].into(), meta_str(|m| m.macro_area.as_ref())).into(),
            Series::new(META_COLUMNS[5].into(), meta_f64(|m| m.latitude)).into(),
            Series::new(META_COLUMNS[6].into(), meta_f64(|m| m.longitude)).into(),
        ];

        for &code in &self.features {
            let values: Vec<Option<&str>> = self.records.iter().map(|r| r.value(code)).collect();
            columns.push(Series::new(code.column_name().into(), values).into());
        }

        DataFrame::new(columns).map_err(|e| WalsError::frame("Failed to build wide table", e))
    }

    /// Persist as CSV, or Parquet when the path ends in `.parquet`
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        write_frame(&mut df, path)?;
        info!("Wrote wide table ({} rows) to {}", df.height(), path.display());
        Ok(())
    }

    /// Reload a wide table written by `write`
    ///
    /// Same duplicate policy as the loader: the first row for an id wins and
    /// each repeated id comes back as a `DuplicateKey` diagnostic.
    pub fn read(path: &Path) -> Result<(Self, Vec<Diagnostic>)> {
        let df = read_delimited(path)?;
        let id_col = require_column(&df, &["language_id"], path)?;
        let ids = string_values(&df, id_col, path)?;

        let mut features: Vec<FeatureCode> = column_names(&df)
            .iter()
            .filter_map(|c| FeatureCode::from_column_name(c))
            .collect();
        features.sort();

        let mut feature_values = Vec::with_capacity(features.len());
        for &code in &features {
            feature_values.push(string_values(&df, code.column_name(), path)?);
        }

        let optional = |name: &str| -> Result<Vec<Option<String>>> {
            match find_column(&df, &[name]) {
                Some(col) => string_values(&df, col, path),
                None => Ok(vec![None; df.height()]),
            }
        };
        let names = optional(META_COLUMNS[1])?;
        let families = optional(META_COLUMNS[2])?;
        let genera = optional(META_COLUMNS[3])?;
        let areas = optional(META_COLUMNS[4])?;
        let latitudes = optional(META_COLUMNS[5])?;
        let longitudes = optional(META_COLUMNS[6])?;

        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        let mut missing_ids = 0usize;
        let mut records: Vec<LanguageRecord> = Vec::with_capacity(ids.len());
        for (idx, id) in ids.into_iter().enumerate() {
            let Some(id) = id else {
                missing_ids += 1;
                continue;
            };
            let count = seen.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                continue;
            }
            let meta = LanguageMeta {
                id: id.clone(),
                name: names[idx].clone(),
                family: families[idx].clone(),
                genus: genera[idx].clone(),
                macro_area: areas[idx].clone(),
                latitude: latitudes[idx].as_deref().and_then(|s| s.parse().ok()),
                longitude: longitudes[idx].as_deref().and_then(|s| s.parse().ok()),
                iso_code: None,
            };
            let has_meta = meta.name.is_some()
                || meta.family.is_some()
                || meta.genus.is_some()
                || meta.macro_area.is_some()
                || meta.latitude.is_some()
                || meta.longitude.is_some();

            records.push(LanguageRecord {
                id,
                features: features
                    .iter()
                    .zip(&feature_values)
                    .map(|(&code, values)| (code, values[idx].clone()))
                    .collect(),
                meta: has_meta.then_some(meta),
            });
        }

        if missing_ids > 0 {
            warn!(
                "{}: skipped {} rows without a language id",
                path.display(),
                missing_ids
            );
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        let diagnostics = duplicate_diagnostics(path, seen);

        Ok((WideTable { features, records }, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(feature: FeatureCode, rows: &[(&str, Option<&str>)]) -> FeatureTable {
        FeatureTable::from_values(
            feature,
            rows.iter()
                .map(|(id, v)| (id.to_string(), v.map(str::to_string))),
        )
    }

    fn sample_tables() -> Vec<FeatureTable> {
        vec![
            table(
                FeatureCode::WordOrder,
                &[("eng", Some("SVO")), ("jpn", Some("SOV")), ("wel", Some("VSO")), ("tag", None)],
            ),
            table(
                FeatureCode::AdpositionOrder,
                &[("eng", Some("Prepositions")), ("jpn", Some("Postpositions"))],
            ),
            table(
                FeatureCode::AdjectiveOrder,
                &[("jpn", Some("Adjective-Noun")), ("wel", Some("Noun-Adjective")), ("xyz", Some("Noun-Adjective"))],
            ),
        ]
    }

    #[test]
    fn test_left_join_keeps_broadest_feature_languages() {
        let wide = WideTable::join(&sample_tables(), JoinPolicy::Left);

        assert_eq!(
            wide.features,
            vec![
                FeatureCode::WordOrder,
                FeatureCode::AdpositionOrder,
                FeatureCode::AdjectiveOrder
            ]
        );
        let ids: Vec<&str> = wide.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["eng", "jpn", "tag", "wel"]);

        let wel = wide.get("wel").unwrap();
        assert_eq!(wel.value(FeatureCode::AdpositionOrder), None);
        assert_eq!(wel.value(FeatureCode::AdjectiveOrder), Some("Noun-Adjective"));
        assert!(!wide.get("tag").unwrap().has(FeatureCode::WordOrder));
    }

    #[test]
    fn test_inner_join_requires_every_feature_table() {
        let wide = WideTable::join(&sample_tables(), JoinPolicy::Inner);
        let ids: Vec<&str> = wide.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["jpn"]);
    }

    #[test]
    fn test_join_is_order_independent() {
        let tables = sample_tables();
        let expected = WideTable::join(&tables, JoinPolicy::Left);

        let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for perm in permutations {
            let reordered: Vec<FeatureTable> = perm.iter().map(|&i| tables[i].clone()).collect();
            assert_eq!(WideTable::join(&reordered, JoinPolicy::Left), expected);
            assert_eq!(
                WideTable::join(&reordered, JoinPolicy::Inner),
                WideTable::join(&tables, JoinPolicy::Inner)
            );
        }
    }

    #[test]
    fn test_left_join_tie_breaks_by_feature_code() {
        let tables = vec![
            table(FeatureCode::GenitiveOrder, &[("a", Some("Genitive-Noun")), ("b", None)]),
            table(FeatureCode::WordOrder, &[("c", Some("SOV")), ("d", Some("SVO"))]),
        ];
        let wide = WideTable::join(&tables, JoinPolicy::Left);
        let ids: Vec<&str> = wide.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn test_empty_join() {
        let wide = WideTable::join(&[], JoinPolicy::Left);
        assert!(wide.is_empty());
        assert!(wide.features.is_empty());
    }

    #[test]
    fn test_write_and_read_round_trip() {
        let mut wide = WideTable::join(&sample_tables(), JoinPolicy::Left);
        let mut metadata = LanguageMetadata::default();
        metadata.languages.insert(
            "jpn".to_string(),
            LanguageMeta {
                id: "jpn".to_string(),
                name: Some("Japanese".to_string()),
                macro_area: Some("Eurasia".to_string()),
                latitude: Some(35.0),
                ..Default::default()
            },
        );
        assert_eq!(wide.attach_metadata(&metadata), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("wide.csv");
        wide.write(&path).unwrap();

        let (reloaded, diagnostics) = WideTable::read(&path).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(reloaded.features, wide.features);
        assert_eq!(reloaded.len(), wide.len());
        let jpn = reloaded.get("jpn").unwrap();
        assert_eq!(jpn.name(), Some("Japanese"));
        assert_eq!(jpn.value(FeatureCode::AdjectiveOrder), Some("Adjective-Noun"));
        assert!(reloaded.get("tag").unwrap().meta.is_none());
    }

    #[test]
    fn test_read_keeps_first_duplicate_and_skips_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.csv");
        std::fs::write(
            &path,
            "language_id,language_name,adjective_order,word_order\n\
             jpn,Japanese,Adjective-Noun,SOV\n\
             ,Nameless,Noun-Adjective,SVO\n\
             eng,English,Adjective-Noun,SVO\n\
             jpn,Japanese (dup),Noun-Adjective,VSO\n",
        )
        .unwrap();

        let (table, diagnostics) = WideTable::read(&path).unwrap();
        // Column order follows the canonical feature order, not the file
        assert_eq!(
            table.features,
            vec![FeatureCode::WordOrder, FeatureCode::AdjectiveOrder]
        );
        let ids: Vec<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["eng", "jpn"]);

        let jpn = table.get("jpn").unwrap();
        assert_eq!(jpn.name(), Some("Japanese"));
        assert_eq!(jpn.value(FeatureCode::WordOrder), Some("SOV"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::DuplicateKey {
                source: path.display().to_string(),
                language_id: "jpn".to_string(),
                occurrences: 2,
            }]
        );
    }
}
