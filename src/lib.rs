//! Greenberg word-order universals over WALS data
//!
//! Pipeline: Loader → Joiner → {Rule Evaluator, Baseline Classifier} →
//! Statistics Reporter.
//!
//! - `data/`: per-feature and language metadata loading with Polars
//! - `join/`: the wide language × feature table
//! - `rules/`, `evaluator/`: universals and their verdict counts
//! - `classifier/`: decision tree vs word-order baseline
//! - `report/`: contingency tables and Markdown/JSON output
//! - `pipeline/`: end-to-end run driven by `config::AnalysisConfig`

pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod join;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod utils;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use data::{FeatureSources, FeatureTable, WalsData};
pub use error::{Diagnostic, Result, WalsError};
pub use evaluator::{evaluate, EvaluationResult};
pub use features::FeatureCode;
pub use join::{JoinPolicy, LanguageRecord, WideTable};
pub use pipeline::{build_report, load_table, run_analysis};
pub use report::{AnalysisReport, Share};
pub use rules::{all_rules, find_rule, UniversalRule, Verdict};
