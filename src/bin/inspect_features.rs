//! Per-feature coverage and duplicate report, without evaluating anything

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wals_universals::{AnalysisConfig, Diagnostic, WalsData};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wals_universals=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AnalysisConfig::from_env()?;
    let data = WalsData::load(&config.sources())?;

    println!("\n=== FEATURE FILES ({}) ===\n", config.data_dir.display());
    println!("{:<6} {:<38} {:>8} {:>8} {:>6}", "WALS", "Feature", "Listed", "Valued", "Dups");
    for table in &data.tables {
        let dups = table
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::DuplicateKey { .. }))
            .count();
        println!(
            "{:<6} {:<38} {:>8} {:>8} {:>6}",
            table.feature.wals_id(),
            table.feature.title(),
            table.len(),
            table.covered(),
            dups
        );
    }

    println!("\nLanguage metadata: {} languages", data.metadata.len());

    let diagnostics: Vec<&Diagnostic> = data.diagnostics().collect();
    if !diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for d in diagnostics.iter().take(20) {
            println!("  - {}", d);
        }
        if diagnostics.len() > 20 {
            println!("  ... and {} more", diagnostics.len() - 20);
        }
    }

    Ok(())
}
