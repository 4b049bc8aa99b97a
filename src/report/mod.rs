//! Statistics Reporter
//!
//! Turns evaluation results and the wide table into an `AnalysisReport`
//! (contingency tables, coverage, classifier comparison, diagnostics) and
//! renders it as Markdown or JSON.

pub mod formatters;
pub mod types;

pub use formatters::{JsonFormatter, MarkdownFormatter};
pub use types::{AnalysisReport, ContingencyTable, FeatureCoverage, Share};

use crate::features::{Adposition, BasicOrder, FeatureCode};
use crate::join::WideTable;

/// "VO" / "OV" for a basic word order; no dominant order is dropped
pub fn verb_object_label(value: &str) -> Option<String> {
    BasicOrder::from_label(value)
        .and_then(|o| o.verb_object())
        .map(|vo| vo.label().to_string())
}

/// Canonical adposition label; unrecognised values are dropped
pub fn adposition_label(value: &str) -> Option<String> {
    Adposition::from_label(value).map(|a| a.label().to_string())
}

fn raw_label(value: &str) -> Option<String> {
    Some(value.trim().to_string())
}

/// The cross-tabulations printed in every report
///
/// Tables whose features are not both columns of the wide table are skipped.
pub fn standard_tables(table: &WideTable) -> Vec<ContingencyTable> {
    use FeatureCode::*;

    let mut tables = Vec::new();
    let has = |a: FeatureCode, b: FeatureCode| table.has_feature(a) && table.has_feature(b);

    if has(WordOrder, AdpositionOrder) {
        let raw = ContingencyTable::build(
            "Word order by adposition",
            table,
            WordOrder,
            raw_label,
            AdpositionOrder,
            adposition_label,
        );
        let grouped = raw.regroup_rows("VO/OV by adposition", verb_object_label);
        tables.push(raw);
        tables.push(grouped);
    }
    if has(AdpositionOrder, GenitiveOrder) {
        tables.push(ContingencyTable::build(
            "Adposition by genitive order",
            table,
            AdpositionOrder,
            adposition_label,
            GenitiveOrder,
            raw_label,
        ));
    }
    for (feature, title) in [
        (AdjectiveOrder, "VO/OV by adjective order"),
        (RelativeClauseOrder, "VO/OV by relative clause order"),
    ] {
        if has(WordOrder, feature) {
            tables.push(ContingencyTable::build(
                title,
                table,
                WordOrder,
                verb_object_label,
                feature,
                raw_label,
            ));
        }
    }
    if has(WordOrder, CaseCountBucket) {
        tables.push(ContingencyTable::build(
            "Word order by case system",
            table,
            WordOrder,
            raw_label,
            CaseCountBucket,
            raw_label,
        ));
    }

    tables
}
