//! End-to-end run: load → join → evaluate → report
//!
//! Outputs written to `output_dir`:
//! - the wide table (`wide_table_file`, CSV or Parquet by extension)
//! - `verdicts/universal_<id>.csv` per rule when `write_verdicts` is set
//! - `report.md` and `report.json`

use anyhow::{Context, Result};
use std::fs;
use std::time::Instant;
use tracing::{info, warn};

use crate::classifier::compare;
use crate::config::AnalysisConfig;
use crate::data::WalsData;
use crate::error::Diagnostic;
use crate::evaluator::{evaluate, evaluate_rows, rule_detail, write_verdicts};
use crate::join::WideTable;
use crate::report::{standard_tables, AnalysisReport, FeatureCoverage, JsonFormatter, MarkdownFormatter};
use crate::rules::all_rules;

pub const MARKDOWN_REPORT: &str = "report.md";
pub const JSON_REPORT: &str = "report.json";

/// Load and join the configured sources, metadata attached
pub fn load_table(config: &AnalysisConfig) -> Result<(WideTable, Vec<Diagnostic>)> {
    let data = WalsData::load(&config.sources()).context("Failed to load WALS data")?;
    let diagnostics: Vec<Diagnostic> = data.diagnostics().cloned().collect();

    let mut table = WideTable::join(&data.tables, config.join_policy);
    let matched = table.attach_metadata(&data.metadata);
    info!(
        "Wide table: {} languages × {} features ({} with metadata)",
        table.len(),
        table.features.len(),
        matched
    );
    Ok((table, diagnostics))
}

/// Evaluate every rule and assemble the report; writes nothing
pub fn build_report(
    table: &WideTable,
    config: &AnalysisConfig,
    mut diagnostics: Vec<Diagnostic>,
) -> Result<AnalysisReport> {
    let rules = all_rules();
    let evaluation = evaluate(table, &rules);
    diagnostics.extend(evaluation.diagnostics);

    let rule_details = rules.iter().map(|rule| rule_detail(table, rule)).collect();

    let classifier = if table.has_feature(config.classifier.target) {
        Some(compare(table, &config.classifier).context("Classifier comparison failed")?)
    } else {
        warn!(
            "Classifier target {} is not a column of the wide table; skipping",
            config.classifier.target
        );
        None
    };

    Ok(AnalysisReport {
        languages: table.len(),
        features: FeatureCoverage::for_table(table),
        evaluations: evaluation.results,
        rule_details,
        contingency_tables: standard_tables(table),
        classifier,
        diagnostics,
    })
}

/// Full run with every output persisted
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let start = Instant::now();

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", config.output_dir))?;

    let (table, diagnostics) = load_table(config)?;
    let wide_path = config.wide_table_path();
    table
        .write(&wide_path)
        .with_context(|| format!("Failed to write wide table: {:?}", wide_path))?;
    info!("Wrote wide table to {:?}", wide_path);

    let report = build_report(&table, config, diagnostics)?;

    if config.write_verdicts {
        let dir = config.output_dir.join("verdicts");
        for rule in all_rules() {
            let verdicts = evaluate_rows(&table, &rule);
            let path = dir.join(format!("universal_{}.csv", rule.id));
            write_verdicts(&path, &table, &rule, &verdicts)
                .with_context(|| format!("Failed to write verdicts for Universal {}", rule.id))?;
        }
        info!("Wrote per-language verdicts to {:?}", dir);
    }

    let md_path = config.output_dir.join(MARKDOWN_REPORT);
    fs::write(&md_path, MarkdownFormatter::format(&report))
        .with_context(|| format!("Failed to write {:?}", md_path))?;

    let json_path = config.output_dir.join(JSON_REPORT);
    let json = JsonFormatter::format(&report).context("Failed to serialize report")?;
    fs::write(&json_path, json).with_context(|| format!("Failed to write {:?}", json_path))?;

    info!(
        "Analysis complete in {:.2}s ({} diagnostics)",
        start.elapsed().as_secs_f64(),
        report.diagnostics.len()
    );
    Ok(report)
}
