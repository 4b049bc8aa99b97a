use crate::classifier::ClassifierComparison;
use crate::evaluator::RuleDetail;
use crate::report::types::{AnalysisReport, ContingencyTable};

/// Markdown formatter for analysis reports
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format the full report as markdown
    pub fn format(report: &AnalysisReport) -> String {
        let mut md = String::with_capacity(4096);

        md.push_str("# Greenberg Word-Order Universals\n\n");
        md.push_str(&format!("**Languages:** {}\n\n", report.languages));

        // Feature coverage
        md.push_str("## Feature Coverage\n\n");
        md.push_str("| Feature | WALS | Languages | Coverage |\n");
        md.push_str("|---------|------|-----------|----------|\n");
        for f in &report.features {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                f.title, f.wals_id, f.covered, f.share
            ));
        }
        md.push('\n');

        // Universals
        md.push_str("## Universals\n\n");
        md.push_str("| Universal | Statement | Satisfied | Violated | Not applicable | Missing data | Unrecognized | Satisfaction |\n");
        md.push_str("|-----------|-----------|-----------|----------|----------------|--------------|--------------|--------------|\n");
        for r in &report.evaluations {
            md.push_str(&format!(
                "| U{} | {} | {} | {} | {} | {} | {} | {} |\n",
                r.rule_id,
                r.statement,
                r.satisfied,
                r.violated,
                r.not_applicable,
                r.missing_data,
                r.unrecognized,
                r.satisfaction
            ));
        }
        md.push('\n');

        if !report.rule_details.is_empty() {
            md.push_str("## Rule Details\n\n");
            for detail in &report.rule_details {
                Self::format_rule_detail(&mut md, detail);
            }
        }

        if !report.contingency_tables.is_empty() {
            md.push_str("## Contingency Tables\n\n");
            for table in &report.contingency_tables {
                Self::format_table(&mut md, table);
            }
        }

        if let Some(classifier) = &report.classifier {
            Self::format_classifier(&mut md, classifier);
        }

        if !report.diagnostics.is_empty() {
            md.push_str("## Diagnostics\n\n");
            for d in &report.diagnostics {
                md.push_str(&format!("- {}\n", d));
            }
            md.push('\n');
        }

        md
    }

    fn format_rule_detail(md: &mut String, detail: &RuleDetail) {
        let c = &detail.coverage;
        md.push_str(&format!("### Universal {}\n\n", detail.rule_id));
        md.push_str(&format!(
            "Testable: {} of {} languages ({})  \n",
            c.testable_languages, c.total_languages, c.testable_fraction
        ));
        md.push_str(&format!(
            "With metadata: {} ({} of testable), {} distinct families\n\n",
            c.with_metadata, c.metadata_fraction_of_testable, c.distinct_families_testable
        ));

        if detail.macro_areas.is_empty() {
            return;
        }
        md.push_str("| Macro-area | Languages | Violations | Rate |\n");
        md.push_str("|------------|-----------|------------|------|\n");
        for area in &detail.macro_areas {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                area.macro_area, area.n_languages, area.n_violations, area.violation_rate
            ));
        }
        md.push('\n');
    }

    fn format_table(md: &mut String, table: &ContingencyTable) {
        md.push_str(&format!("### {}\n\n", table.title));

        md.push_str(&format!("| {} \\ {} |", table.row_feature, table.column_feature));
        for col in &table.columns {
            md.push_str(&format!(" {} |", col));
        }
        md.push_str(" Total |\n|---|");
        for _ in &table.columns {
            md.push_str("---|");
        }
        md.push_str("---|\n");

        for row in &table.rows {
            md.push_str(&format!("| {} |", row));
            for col in &table.columns {
                md.push_str(&format!(" {} |", table.count(row, col)));
            }
            md.push_str(&format!(" {} |\n", table.row_total(row)));
        }

        if table.excluded > 0 {
            md.push_str(&format!(
                "\n*{} languages excluded (missing or unlabelled value)*\n",
                table.excluded
            ));
        }
        md.push('\n');
    }

    fn format_classifier(md: &mut String, c: &ClassifierComparison) {
        md.push_str("## Baseline Classifier\n\n");
        let predictors: Vec<&str> = c.predictors.iter().map(|p| p.column_name()).collect();
        md.push_str(&format!("**Target:** {}  \n", c.target));
        md.push_str(&format!("**Predictors:** {}  \n", predictors.join(", ")));
        md.push_str(&format!(
            "**Split:** {} train / {} test (seed {}, {} rows without target excluded)\n\n",
            c.train_size, c.test_size, c.seed, c.excluded_rows
        ));

        md.push_str("| Model | Accuracy |\n");
        md.push_str("|-------|----------|\n");
        md.push_str(&format!(
            "| Decision tree (depth {}, {} leaves) | {} |\n",
            c.tree_depth, c.tree_leaves, c.tree_accuracy
        ));
        if let Some(rule) = &c.rule_accuracy {
            md.push_str(&format!("| Word-order rule | {} |\n", rule));
        }
        md.push_str(&format!(
            "| Majority class ({}) | {} |\n\n",
            c.majority_class, c.majority_accuracy
        ));

        if !c.tree_summary.is_empty() {
            md.push_str("```text\n");
            for line in &c.tree_summary {
                md.push_str(line);
                md.push('\n');
            }
            md.push_str("```\n\n");
        }
    }
}
