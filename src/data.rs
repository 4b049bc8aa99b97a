//! Data Loading
//!
//! Reads one delimited file per WALS feature plus the language metadata
//! table using Polars, and turns each into a map keyed by language id.
//!
//! Duplicate policy: when a language id repeats within one file the FIRST
//! occurrence wins. Every repeat is reported as `Diagnostic::DuplicateKey`.
//!
//! Values are the WALS description labels. A CLDF `values.csv` only carries
//! numeric codes, so its `Code_ID`s are resolved through the sibling
//! `codes.csv`; without that file a numeric-only value column is rejected.

use polars::prelude::DataFrame;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, Result, WalsError};
use crate::features::FeatureCode;
use crate::utils::{column_names, find_column, read_delimited, require_column, string_values};

/// Accepted headers (after normalization) for the language identifier
pub const ID_COLUMNS: &[&str] = &["wals_code", "language_id", "id"];

/// Accepted headers for the categorical value, in order of preference
pub const VALUE_COLUMNS: &[&str] = &["description", "value"];

/// CLDF code table looked up next to a `values.csv`
pub const CODES_FILE: &str = "codes.csv";

/// Per-feature source files and the language metadata file
#[derive(Debug, Clone)]
pub struct FeatureSources {
    pub features: BTreeMap<FeatureCode, PathBuf>,
    pub languages: PathBuf,
}

/// Values of a single feature keyed by language id
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub feature: FeatureCode,
    pub source: PathBuf,
    /// `None` when the language is listed but the value is missing
    pub values: BTreeMap<String, Option<String>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FeatureTable {
    pub fn from_values(
        feature: FeatureCode,
        values: impl IntoIterator<Item = (String, Option<String>)>,
    ) -> Self {
        FeatureTable {
            feature,
            source: PathBuf::from(format!("<{}>", feature.wals_id())),
            values: values.into_iter().collect(),
            diagnostics: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Languages with a non-missing value
    pub fn covered(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }

    pub fn get(&self, language_id: &str) -> Option<&str> {
        self.values.get(language_id).and_then(|v| v.as_deref())
    }
}

/// One row of the language metadata table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageMeta {
    pub id: String,
    pub name: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub macro_area: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub iso_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageMetadata {
    pub languages: BTreeMap<String, LanguageMeta>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LanguageMetadata {
    pub fn get(&self, language_id: &str) -> Option<&LanguageMeta> {
        self.languages.get(language_id)
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Everything the Joiner needs
pub struct WalsData {
    pub tables: Vec<FeatureTable>,
    pub metadata: LanguageMetadata,
}

impl WalsData {
    /// Load every feature file and the metadata table
    pub fn load(sources: &FeatureSources) -> Result<Self> {
        info!(
            "Loading {} feature files and language metadata...",
            sources.features.len()
        );

        let mut tables = Vec::with_capacity(sources.features.len());
        for (&feature, path) in &sources.features {
            let table = load_feature_table(feature, path)?;
            info!(
                "  {} ({}): {} languages, {} with values",
                feature.wals_id(),
                feature,
                table.len(),
                table.covered()
            );
            tables.push(table);
        }

        let metadata = load_language_metadata(&sources.languages)?;
        info!("  Language metadata: {}", metadata.len());

        Ok(WalsData { tables, metadata })
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.tables
            .iter()
            .flat_map(|t| t.diagnostics.iter())
            .chain(self.metadata.diagnostics.iter())
    }
}

/// Load a single per-feature file
///
/// Rows of a multi-feature (CLDF-style) file are restricted to this feature
/// when a `parameter_id` column is present.
pub fn load_feature_table(feature: FeatureCode, path: &Path) -> Result<FeatureTable> {
    let df = read_delimited(path)?;

    let id_col = require_column(&df, ID_COLUMNS, path)?;
    let ids = string_values(&df, id_col, path)?;
    let raw_values = value_labels(&df, path)?;
    let parameters = match find_column(&df, &["parameter_id"]) {
        Some(col) => Some(string_values(&df, col, path)?),
        None => None,
    };

    let rows = ids.into_iter().zip(raw_values).enumerate().filter(|(idx, _)| {
        parameters.as_ref().map_or(true, |params| {
            params[*idx].as_deref().and_then(FeatureCode::from_wals_id) == Some(feature)
        })
    });

    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut values = BTreeMap::new();
    let mut missing_ids = 0usize;

    for (_, (id, raw)) in rows {
        let Some(id) = id else {
            missing_ids += 1;
            continue;
        };
        let count = seen.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            continue;
        }
        let value = raw.as_deref().and_then(|r| feature.normalize_value(r));
        values.insert(id, value);
    }

    if missing_ids > 0 {
        debug!(
            "{}: skipped {} rows without a language id",
            path.display(),
            missing_ids
        );
    }

    let diagnostics = duplicate_diagnostics(path, seen);

    Ok(FeatureTable {
        feature,
        source: path.to_path_buf(),
        values,
        diagnostics,
    })
}

/// Value label for every row of a feature file
///
/// `description` is used as-is. Otherwise a `code_id` column is resolved
/// through `codes.csv` when one sits next to the file; codes with no entry
/// there are kept raw so the evaluator reports them. A `value` column that
/// holds nothing but numbers cannot be interpreted and is rejected.
fn value_labels(df: &DataFrame, path: &Path) -> Result<Vec<Option<String>>> {
    if find_column(df, &["description"]).is_none() {
        let codes_path = path.with_file_name(CODES_FILE);
        if let Some(code_col) = find_column(df, &["code_id"]).filter(|_| codes_path.is_file()) {
            let labels = load_code_labels(&codes_path)?;
            debug!(
                "{}: resolving {} through {} codes in {}",
                path.display(),
                code_col,
                labels.len(),
                codes_path.display()
            );
            let codes = string_values(df, code_col, path)?;
            return Ok(codes
                .into_iter()
                .map(|code| code.map(|c| labels.get(&c).cloned().unwrap_or(c)))
                .collect());
        }
    }

    let value_col = require_column(df, VALUE_COLUMNS, path)?;
    let values = string_values(df, value_col, path)?;

    let mut present = values.iter().flatten().peekable();
    let numeric_only = present.peek().is_some() && present.all(|v| v.parse::<f64>().is_ok());
    if value_col != "description" && numeric_only {
        warn!(
            "{}: '{}' holds only numeric codes and no {} was found to resolve them",
            path.display(),
            value_col,
            CODES_FILE
        );
        return Err(WalsError::MissingColumn {
            file: path.to_path_buf(),
            column: "description".to_string(),
            available: column_names(df),
        });
    }
    Ok(values)
}

/// CLDF code id → label, preferring `Name` over `Description`
fn load_code_labels(path: &Path) -> Result<FxHashMap<String, String>> {
    let df = read_delimited(path)?;
    let id_col = require_column(&df, &["id"], path)?;
    let label_col = require_column(&df, &["name", "description"], path)?;

    let ids = string_values(&df, id_col, path)?;
    let labels = string_values(&df, label_col, path)?;

    Ok(ids
        .into_iter()
        .zip(labels)
        .filter_map(|(id, label)| Some((id?, label?)))
        .collect())
}

/// Load the language metadata table (id → name, family, area, coordinates)
pub fn load_language_metadata(path: &Path) -> Result<LanguageMetadata> {
    let df = read_delimited(path)?;
    let id_col = require_column(&df, &["id", "wals_code", "language_id"], path)?;
    let ids = string_values(&df, id_col, path)?;

    let optional = |candidates: &[&str]| -> Result<Vec<Option<String>>> {
        match find_column(&df, candidates) {
            Some(col) => string_values(&df, col, path),
            None => Ok(vec![None; df.height()]),
        }
    };
    let names = optional(&["name"])?;
    let families = optional(&["family"])?;
    let genera = optional(&["genus"])?;
    let areas = optional(&["macroarea", "macro_area", "area"])?;
    let latitudes = optional(&["latitude"])?;
    let longitudes = optional(&["longitude"])?;
    let iso_codes = optional(&["iso639p3code", "iso_code"])?;

    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut languages = BTreeMap::new();

    for (idx, id) in ids.into_iter().enumerate() {
        let Some(id) = id else { continue };
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
            iso_code: iso_codes[idx].clone(),
        };
        languages.insert(id, meta);
    }

    let diagnostics = duplicate_diagnostics(path, seen);

    Ok(LanguageMetadata {
        languages,
        diagnostics,
    })
}

/// One `DuplicateKey` per repeated id, ordered by id
pub(crate) fn duplicate_diagnostics(path: &Path, seen: FxHashMap<String, usize>) -> Vec<Diagnostic> {
    let source = path.display().to_string();
    let mut duplicates: Vec<(String, usize)> =
        seen.into_iter().filter(|(_, count)| *count > 1).collect();
    duplicates.sort();

    duplicates
        .into_iter()
        .map(|(language_id, occurrences)| {
            warn!(
                "{}: duplicate language id '{}' ({} rows), keeping the first",
                source, language_id, occurrences
            );
            Diagnostic::DuplicateKey {
                source: source.clone(),
                language_id,
                occurrences,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalsError;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_feature_table_first_duplicate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "87A.tab",
            "wals code\tname\tvalue\tdescription\n\
             eng\tEnglish\t1\tAdjective-Noun\n\
             fre\tFrench\t2\tNoun-Adjective\n\
             eng\tEnglish\t2\tNoun-Adjective\n\
             jpn\tJapanese\t1\t--\n",
        );

        let table = load_feature_table(FeatureCode::AdjectiveOrder, &path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.covered(), 2);
        assert_eq!(table.get("eng"), Some("Adjective-Noun"));
        assert_eq!(table.get("jpn"), None);
        assert!(table.values.contains_key("jpn"));
        assert_eq!(
            table.diagnostics,
            vec![Diagnostic::DuplicateKey {
                source: path.display().to_string(),
                language_id: "eng".to_string(),
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn test_load_feature_table_missing_value_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "81A.csv", "wals_code,name\neng,English\n");

        let err = load_feature_table(FeatureCode::WordOrder, &path).unwrap_err();
        match err {
            WalsError::MissingColumn { column, .. } => assert_eq!(column, "description"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_feature_table_filters_parameter_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "values.csv",
            "ID,Language_ID,Parameter_ID,Value\n\
             81A-eng,eng,81A,SVO\n\
             87A-eng,eng,87A,Adjective-Noun\n\
             81A-jpn,jpn,81A,SOV\n",
        );

        let table = load_feature_table(FeatureCode::WordOrder, &path).unwrap();
        // "id" is also an accepted id header but "language_id" is preferred
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("eng"), Some("SVO"));
        assert_eq!(table.get("jpn"), Some("SOV"));
    }

    #[test]
    fn test_numeric_cldf_values_without_codes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "values.csv",
            "ID,Language_ID,Parameter_ID,Value,Code_ID\n\
             81A-eng,eng,81A,2,81A-2\n\
             81A-jpn,jpn,81A,1,81A-1\n",
        );

        let err = load_feature_table(FeatureCode::WordOrder, &path).unwrap_err();
        match err {
            WalsError::MissingColumn { column, available, .. } => {
                assert_eq!(column, "description");
                assert!(available.contains(&"code_id".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cldf_code_ids_resolve_through_codes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "values.csv",
            "ID,Language_ID,Parameter_ID,Value,Code_ID\n\
             81A-eng,eng,81A,2,81A-2\n\
             81A-jpn,jpn,81A,1,81A-1\n\
             81A-xyz,xyz,81A,9,81A-9\n\
             85A-eng,eng,85A,2,85A-2\n",
        );
        write(
            dir.path(),
            CODES_FILE,
            "ID,Parameter_ID,Name,Description,Number\n\
             81A-1,81A,SOV,SOV,1\n\
             81A-2,81A,SVO,SVO,2\n\
             85A-2,85A,Prepositions,Prepositions,2\n",
        );

        let table = load_feature_table(FeatureCode::WordOrder, &path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("eng"), Some("SVO"));
        assert_eq!(table.get("jpn"), Some("SOV"));
        // No entry in codes.csv: kept raw so it is flagged downstream
        assert_eq!(table.get("xyz"), Some("81A-9"));
        assert!(!FeatureCode::WordOrder.recognizes("81A-9"));

        let adpositions = load_feature_table(FeatureCode::AdpositionOrder, &path).unwrap();
        assert_eq!(adpositions.get("eng"), Some("Prepositions"));
    }

    #[test]
    fn test_unbucketable_case_label_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "49A.csv", "wals_code,description
abc,Several cases
");

        let table = load_feature_table(FeatureCode::CaseCountBucket, &path).unwrap();
        assert_eq!(table.get("abc"), Some("Several cases"));
    }

    #[test]
    fn test_case_counts_are_bucketed_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "49A.csv",
            "wals_code,description\nfin,10 or more cases\neng,2 cases\nvie,No morphological case-marking\n",
        );

        let table = load_feature_table(FeatureCode::CaseCountBucket, &path).unwrap();
        assert_eq!(table.get("fin"), Some("5+"));
        assert_eq!(table.get("eng"), Some("2-4"));
        assert_eq!(table.get("vie"), Some("none"));
    }

    #[test]
    fn test_load_language_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "languages.csv",
            "ID,Name,Macroarea,Latitude,Longitude,Family,ISO639P3code\n\
             eng,English,Eurasia,52.0,0.0,Indo-European,eng\n\
             jpn,Japanese,Eurasia,35.0,135.0,Japanese,jpn\n\
             eng,English (dup),Eurasia,,,Indo-European,eng\n",
        );

        let meta = load_language_metadata(&path).unwrap();
        assert_eq!(meta.len(), 2);
        let eng = meta.get("eng").unwrap();
        assert_eq!(eng.name.as_deref(), Some("English"));
        assert_eq!(eng.macro_area.as_deref(), Some("Eurasia"));
        assert_eq!(eng.latitude, Some(52.0));
        assert_eq!(eng.genus, None);
        assert_eq!(meta.diagnostics.len(), 1);
    }
}
