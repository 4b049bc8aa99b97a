//! Error and diagnostic types
//!
//! Fatal conditions abort the run through `WalsError`. Recoverable data
//! problems are collected as `Diagnostic`s and surfaced in the report.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::features::FeatureCode;

pub type Result<T> = std::result::Result<T, WalsError>;

#[derive(Debug, Error)]
pub enum WalsError {
    /// A required column could not be located in a source file
    #[error("{file}: missing required column '{column}' (available: {available:?})")]
    MissingColumn {
        file: PathBuf,
        column: String,
        available: Vec<String>,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Frame {
        context: String,
        #[source]
        source: polars::prelude::PolarsError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no rows left to train on for target '{target}'")]
    EmptyTrainingSet { target: FeatureCode },
}

impl WalsError {
    pub(crate) fn frame(context: impl Into<String>, source: polars::prelude::PolarsError) -> Self {
        WalsError::Frame {
            context: context.into(),
            source,
        }
    }
}

/// Recoverable data-quality conditions, logged and carried into the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Language id repeated within one source file; the first row was kept
    DuplicateKey {
        source: String,
        language_id: String,
        occurrences: usize,
    },
    /// Rows excluded from a rule because a dependent feature was absent
    MissingFeatureValue {
        rule_id: String,
        rows: usize,
    },
    /// No row could be tested against a rule
    ZeroApplicableRows { rule_id: String },
    /// A present value that the feature's typed view cannot interpret
    UnrecognizedValue {
        feature: FeatureCode,
        value: String,
        rows: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateKey {
                source,
                language_id,
                occurrences,
            } => write!(
                f,
                "{}: language '{}' appears {} times, first occurrence kept",
                source, language_id, occurrences
            ),
            Diagnostic::MissingFeatureValue { rule_id, rows } => write!(
                f,
                "Universal {}: {} rows lack a dependent feature and were excluded",
                rule_id, rows
            ),
            Diagnostic::ZeroApplicableRows { rule_id } => {
                write!(f, "Universal {}: no applicable rows", rule_id)
            }
            Diagnostic::UnrecognizedValue { feature, value, rows } => write!(
                f,
                "{} ({}): unrecognized value '{}' in {} rows",
                feature,
                feature.wals_id(),
                value,
                rows
            ),
        }
    }
}
