//! Rule Evaluator - applies every universal to every language
//!
//! Applicability comes first: a language missing any dependent feature is
//! set aside as missing data, and one whose label cannot be interpreted is
//! set aside as unrecognized. Both are excluded from the numerator and the
//! denominator of the satisfaction share. Only then is the predicate run.
//!
//! Counts are a pure function of the rows; family sampling bias is reported
//! through `CoverageReport::distinct_families_testable`, not corrected.

use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, Result, WalsError};
use crate::features::FeatureCode;
use crate::join::{LanguageRecord, WideTable};
use crate::report::Share;
use crate::rules::{RuleCheck, UniversalRule, Verdict};
use crate::utils::write_frame;

/// Aggregate outcome of one rule over the wide table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub rule_id: String,
    pub statement: String,
    pub depends_on: Vec<FeatureCode>,
    pub total: usize,
    pub not_applicable: usize,
    /// Part of `not_applicable`: a dependent feature had no value
    pub missing_data: usize,
    /// Part of `not_applicable`: a dependent feature had an unreadable label
    pub unrecognized: usize,
    /// Part of `not_applicable`: the rule's condition does not hold
    pub antecedent_false: usize,
    pub satisfied: usize,
    pub violated: usize,
    /// satisfied / (satisfied + violated)
    pub satisfaction: Share,
}

impl EvaluationResult {
    pub fn applicable(&self) -> usize {
        self.satisfied + self.violated
    }
}

/// One language's verdict under one rule
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageVerdict {
    pub language_id: String,
    pub verdict: Verdict,
    /// Dependent features without a value (empty when evaluated)
    pub missing: SmallVec<[FeatureCode; 4]>,
    /// Dependent features whose label could not be read
    pub unrecognized: SmallVec<[FeatureCode; 4]>,
}

impl LanguageVerdict {
    pub fn is_testable(&self) -> bool {
        self.verdict != Verdict::NotApplicable
    }
}

/// Results for a rule set plus the recoverable conditions met on the way
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub results: Vec<EvaluationResult>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Violation counts for languages of one macro-area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroAreaSummary {
    pub macro_area: String,
    pub n_languages: usize,
    pub n_violations: usize,
    pub violation_rate: Share,
}

/// How much of the table a rule could actually test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub total_languages: usize,
    pub testable_languages: usize,
    pub testable_fraction: Share,
    pub with_metadata: usize,
    pub metadata_fraction_of_testable: Share,
    pub distinct_families_testable: usize,
}

/// Drill-down for a single rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDetail {
    pub rule_id: String,
    pub coverage: CoverageReport,
    pub macro_areas: Vec<MacroAreaSummary>,
}

/// Verdict for every row, in table order
pub fn evaluate_rows(table: &WideTable, rule: &UniversalRule) -> Vec<LanguageVerdict> {
    table
        .iter()
        .map(|record| {
            let (verdict, missing, unrecognized) = match rule.check(record) {
                RuleCheck::MissingData(missing) => (Verdict::NotApplicable, missing, SmallVec::new()),
                RuleCheck::Unrecognized(codes) => (Verdict::NotApplicable, SmallVec::new(), codes),
                RuleCheck::Evaluated(verdict) => (verdict, SmallVec::new(), SmallVec::new()),
            };
            LanguageVerdict {
                language_id: record.id.clone(),
                verdict,
                missing,
                unrecognized,
            }
        })
        .collect()
}

/// Tally per-row verdicts into an `EvaluationResult`
pub fn tally(rule: &UniversalRule, verdicts: &[LanguageVerdict]) -> EvaluationResult {
    let mut missing_data = 0;
    let mut unrecognized = 0;
    let mut antecedent_false = 0;
    let mut satisfied = 0;
    let mut violated = 0;

    for v in verdicts {
        match v.verdict {
            Verdict::Satisfied => satisfied += 1,
            Verdict::Violated => violated += 1,
            Verdict::NotApplicable if !v.missing.is_empty() => missing_data += 1,
            Verdict::NotApplicable if !v.unrecognized.is_empty() => unrecognized += 1,
            Verdict::NotApplicable => antecedent_false += 1,
        }
    }

    EvaluationResult {
        rule_id: rule.id.to_string(),
        statement: rule.statement.to_string(),
        depends_on: rule.depends_on.to_vec(),
        total: verdicts.len(),
        not_applicable: missing_data + unrecognized + antecedent_false,
        missing_data,
        unrecognized,
        antecedent_false,
        satisfied,
        violated,
        satisfaction: Share::new(satisfied, satisfied + violated),
    }
}

pub fn evaluate_rule(table: &WideTable, rule: &UniversalRule) -> EvaluationResult {
    tally(rule, &evaluate_rows(table, rule))
}

/// One diagnostic per (feature, label) the typed views cannot read
///
/// Sorted by feature, then label.
pub fn unrecognized_values(table: &WideTable, features: &[FeatureCode]) -> Vec<Diagnostic> {
    let mut counts: BTreeMap<(FeatureCode, &str), usize> = BTreeMap::new();
    for record in table.iter() {
        for &code in features {
            if let Some(value) = record.value(code).filter(|v| !code.recognizes(v)) {
                *counts.entry((code, value)).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|((feature, value), rows)| {
            warn!(
                "{} ({}): unrecognized value '{}' in {} rows, excluded from dependent rules",
                feature,
                feature.wals_id(),
                value,
                rows
            );
            Diagnostic::UnrecognizedValue {
                feature,
                value: value.to_string(),
                rows,
            }
        })
        .collect()
}

/// Evaluate a rule set, collecting diagnostics for excluded rows
pub fn evaluate(table: &WideTable, rules: &[UniversalRule]) -> Evaluation {
    let mut results = Vec::with_capacity(rules.len());
    let used: BTreeSet<FeatureCode> = rules
        .iter()
        .flat_map(|r| r.depends_on.iter().copied())
        .collect();
    let used: Vec<FeatureCode> = used.into_iter().collect();
    let mut diagnostics = unrecognized_values(table, &used);

    for rule in rules {
        let absent: Vec<FeatureCode> = rule
            .depends_on
            .iter()
            .copied()
            .filter(|code| !table.has_feature(*code))
            .collect();
        if !absent.is_empty() {
            warn!(
                "Universal {}: feature columns {:?} are not in the joined table",
                rule.id, absent
            );
        }

        let result = evaluate_rule(table, rule);

        if result.missing_data > 0 {
            debug!(
                "Universal {}: {} rows excluded for missing feature values",
                rule.id, result.missing_data
            );
            diagnostics.push(Diagnostic::MissingFeatureValue {
                rule_id: rule.id.to_string(),
                rows: result.missing_data,
            });
        }
        if result.unrecognized > 0 {
            debug!(
                "Universal {}: {} rows excluded for unrecognized labels",
                rule.id, result.unrecognized
            );
        }
        if result.applicable() == 0 {
            info!("Universal {}: no applicable rows", rule.id);
            diagnostics.push(Diagnostic::ZeroApplicableRows {
                rule_id: rule.id.to_string(),
            });
        }

        info!(
            "Universal {}: {} satisfied, {} violated, {} not applicable ({})",
            result.rule_id,
            result.satisfied,
            result.violated,
            result.not_applicable,
            result.satisfaction
        );
        results.push(result);
    }

    Evaluation {
        results,
        diagnostics,
    }
}

/// Violations by macro-area over testable languages with metadata
///
/// Sorted by violations, then languages (both descending), then area name.
pub fn macro_area_summary(table: &WideTable, verdicts: &[LanguageVerdict]) -> Vec<MacroAreaSummary> {
    let mut by_area: FxHashMap<String, (usize, usize)> = FxHashMap::default();

    for (record, verdict) in testable_with_records(table, verdicts) {
        let Some(meta) = &record.meta else { continue };
        let area = meta.macro_area.clone().unwrap_or_else(|| "unknown".to_string());
        let entry = by_area.entry(area).or_insert((0, 0));
        entry.0 += 1;
        if verdict.verdict == Verdict::Violated {
            entry.1 += 1;
        }
    }

    let mut summary: Vec<MacroAreaSummary> = by_area
        .into_iter()
        .map(|(macro_area, (n_languages, n_violations))| MacroAreaSummary {
            macro_area,
            n_languages,
            n_violations,
            violation_rate: Share::new(n_violations, n_languages),
        })
        .collect();

    summary.sort_by(|a, b| {
        b.n_violations
            .cmp(&a.n_violations)
            .then(b.n_languages.cmp(&a.n_languages))
            .then_with(|| a.macro_area.cmp(&b.macro_area))
    });
    summary
}

/// Total vs testable vs metadata-joinable languages
pub fn coverage(table: &WideTable, verdicts: &[LanguageVerdict]) -> CoverageReport {
    let testable: Vec<&LanguageRecord> = testable_with_records(table, verdicts)
        .map(|(record, _)| record)
        .collect();
    let with_metadata = testable.iter().filter(|r| r.meta.is_some()).count();
    let families: FxHashSet<&str> = testable.iter().filter_map(|r| r.family()).collect();

    CoverageReport {
        total_languages: table.len(),
        testable_languages: testable.len(),
        testable_fraction: Share::new(testable.len(), table.len()),
        with_metadata,
        metadata_fraction_of_testable: Share::new(with_metadata, testable.len()),
        distinct_families_testable: families.len(),
    }
}

pub fn rule_detail(table: &WideTable, rule: &UniversalRule) -> RuleDetail {
    let verdicts = evaluate_rows(table, rule);
    RuleDetail {
        rule_id: rule.id.to_string(),
        coverage: coverage(table, &verdicts),
        macro_areas: macro_area_summary(table, &verdicts),
    }
}

fn testable_with_records<'a>(
    table: &'a WideTable,
    verdicts: &'a [LanguageVerdict],
) -> impl Iterator<Item = (&'a LanguageRecord, &'a LanguageVerdict)> {
    verdicts
        .iter()
        .filter(|v| v.is_testable())
        .filter_map(move |v| table.get(&v.language_id).map(|r| (r, v)))
}

/// Testable rows only, with follows/violates flags and the rule's features
pub fn verdict_frame(
    table: &WideTable,
    rule: &UniversalRule,
    verdicts: &[LanguageVerdict],
) -> Result<DataFrame> {
    let rows: Vec<(&LanguageRecord, &LanguageVerdict)> =
        testable_with_records(table, verdicts).collect();

    let ids: Vec<&str> = rows.iter().map(|(r, _)| r.id.as_str()).collect();
    let names: Vec<Option<&str>> = rows.iter().map(|(r, _)| r.name()).collect();
    let families: Vec<Option<&str>> = rows.iter().map(|(r, _)| r.family()).collect();
    let areas: Vec<Option<&str>> = rows.iter().map(|(r, _)| r.macro_area()).collect();
    let rule_ids: Vec<&str> = vec![rule.id; rows.len()];
    let follows: Vec<i32> = rows
        .iter()
        .map(|(_, v)| i32::from(v.verdict == Verdict::Satisfied))
        .collect();
    let violates: Vec<i32> = follows.iter().map(|f| 1 - f).collect();

    let mut columns: Vec<Column> = vec![
        Series::new("language_id".into(), ids).into(),
        Series::new("language_name".into(), names).into(),
        Series::new("family".into(), families).into(),
        Series::new("macro_area".into(), areas).into(),
        Series::new("rule_id".into(), rule_ids).into(),
        Series::new("follows_rule".into(), follows).into(),
        Series::new("violates_rule".into(), violates).into(),
    ];
    for &code in rule.depends_on {
        let values: Vec<Option<&str>> = rows.iter().map(|(r, _)| r.value(code)).collect();
        columns.push(Series::new(code.column_name().into(), values).into());
    }

    DataFrame::new(columns).map_err(|e| {
        WalsError::frame(format!("Failed to build verdict table for Universal {}", rule.id), e)
    })
}

pub fn write_verdicts(
    path: &Path,
    table: &WideTable,
    rule: &UniversalRule,
    verdicts: &[LanguageVerdict],
) -> Result<()> {
    let mut df = verdict_frame(table, rule, verdicts)?;
    write_frame(&mut df, path)
}
