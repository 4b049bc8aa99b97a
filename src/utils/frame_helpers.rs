//! DataFrame helpers with column validation
//!
//! Provides safe, explicit patterns for reading delimited source files with
//! Polars and pulling string columns out of them, so a missing column is
//! reported against the file it was expected in.

use polars::prelude::*;
use std::path::Path;

use crate::error::{Result, WalsError};

/// Tokens treated as a missing value in every source column
pub const NULL_TOKENS: &[&str] = &["--", "NA", "NaN"];

/// Read a delimited (or Parquet) file with every column as a string
///
/// Separator is chosen from the extension: tab for `.tab`, `.tsv` and
/// `.txt`, comma otherwise. Column names are normalized on the way in.
pub fn read_delimited(path: &Path) -> Result<DataFrame> {
    std::fs::metadata(path).map_err(|source| WalsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mut df = if extension == "parquet" {
        LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(|e| WalsError::frame(format!("Failed to load parquet {}", path.display()), e))?
    } else {
        let separator = match extension.as_str() {
            "tab" | "tsv" | "txt" => b'\t',
            _ => b',',
        };
        let null_values: Vec<PlSmallStr> = NULL_TOKENS.iter().map(|&t| t.into()).collect();
        let parse_options = CsvParseOptions::default()
            .with_separator(separator)
            .with_null_values(Some(NullValues::AllColumns(null_values)));

        CsvReadOptions::default()
            .with_has_header(true)
            // Schema length 0 reads every column as String
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_options)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| WalsError::frame(format!("Failed to load {}", path.display()), e))?
    };

    normalize_column_names(&mut df)
        .map_err(|e| WalsError::frame(format!("{}: bad column names", path.display()), e))?;
    Ok(df)
}

/// Write a frame as CSV, or Parquet when the path ends in `.parquet`
///
/// Parent directories are created as needed.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| WalsError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut file = std::fs::File::create(path).map_err(|source| WalsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_parquet = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    let written = if is_parquet {
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Zstd(None))
            .finish(df)
            .map(|_| ())
    } else {
        CsvWriter::new(&mut file).include_header(true).finish(df)
    };
    written.map_err(|e| WalsError::frame(format!("Failed to write {}", path.display()), e))
}

/// Lower-case a header and collapse non-alphanumeric runs into `_`
///
/// `"wals code"` → `"wals_code"`, `"Language_ID"` → `"language_id"`
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

pub fn normalize_column_names(df: &mut DataFrame) -> PolarsResult<()> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| normalize_column_name(name.as_str()))
        .collect();
    df.set_column_names(names)
}

/// Return the first candidate column present in `df`
///
/// # Errors
/// `MissingColumn` naming the first candidate and the columns available.
pub fn require_column<'a>(df: &DataFrame, candidates: &[&'a str], file: &Path) -> Result<&'a str> {
    let available = column_names(df);
    candidates
        .iter()
        .copied()
        .find(|c| available.iter().any(|a| a == c))
        .ok_or_else(|| WalsError::MissingColumn {
            file: file.to_path_buf(),
            column: candidates.first().copied().unwrap_or_default().to_string(),
            available,
        })
}

/// Optional counterpart of `require_column`
pub fn find_column<'a>(df: &DataFrame, candidates: &[&'a str]) -> Option<&'a str> {
    let available = column_names(df);
    candidates
        .iter()
        .copied()
        .find(|c| available.iter().any(|a| a == c))
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Extract a column as trimmed strings; blanks become `None`
pub fn string_values(df: &DataFrame, column: &str, file: &Path) -> Result<Vec<Option<String>>> {
    let context = || format!("{}: column '{}'", file.display(), column);
    let values = df
        .column(column)
        .and_then(|c| c.cast(&DataType::String))
        .map_err(|e| WalsError::frame(context(), e))?;
    let strings = values.str().map_err(|e| WalsError::frame(context(), e))?;

    Ok(strings
        .into_iter()
        .map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect())
}
