//! Full analysis run
//!
//! Configuration: `WALS_CONFIG` (JSON file), `WALS_DATA_DIR`,
//! `WALS_OUTPUT_DIR`, `WALS_SEED`. Log level via `RUST_LOG`.

use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wals_universals::{run_analysis, AnalysisConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wals_universals=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n{}", "=".repeat(80));
    println!("GREENBERG UNIVERSALS OVER WALS");
    println!("{}", "=".repeat(80));

    let start = Instant::now();
    let config = AnalysisConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  data_dir: {:?}", config.data_dir);
    tracing::info!("  output_dir: {:?}", config.output_dir);
    tracing::info!("  join_policy: {:?}", config.join_policy);
    tracing::info!("  seed: {}", config.classifier.seed);

    let report = run_analysis(&config)?;

    println!("\nLanguages: {}", report.languages);
    println!("\n{:<6} {:>10} {:>10} {:>10} {:>14}", "Rule", "Satisfied", "Violated", "N/A", "Satisfaction");
    println!("{}", "-".repeat(54));
    for r in &report.evaluations {
        println!(
            "U{:<5} {:>10} {:>10} {:>10} {:>14}",
            r.rule_id,
            r.satisfied,
            r.violated,
            r.not_applicable,
            r.satisfaction.to_string()
        );
    }

    if let Some(c) = &report.classifier {
        println!("\nClassifier ({} test rows):", c.test_size);
        println!("  Decision tree:   {}", c.tree_accuracy);
        if let Some(rule) = &c.rule_accuracy {
            println!("  Word-order rule: {}", rule);
        }
        println!("  Majority class:  {}", c.majority_accuracy);
    }

    if !report.diagnostics.is_empty() {
        println!("\n{} diagnostics (see report.md)", report.diagnostics.len());
    }

    println!("\n{}", "=".repeat(80));
    println!("Done in {:.2}s, outputs in {:?}", start.elapsed().as_secs_f64(), config.output_dir);
    println!("{}", "=".repeat(80));

    Ok(())
}
