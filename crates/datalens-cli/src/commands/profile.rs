//! Profile command - parse, infer and profile a file without storing it.

use std::path::PathBuf;

use colored::Colorize;
use datalens::Pipeline;
use tracing::warn;

use crate::cli::Settings;

pub fn run(
    settings: &Settings,
    file: PathBuf,
    output: Option<PathBuf>,
    summary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    // Nothing is stored, so the store directory is never touched
    let pipeline = Pipeline::in_memory(super::pipeline_config(settings)?);
    let analysis = pipeline.analyze_file(&file)?;

    if !analysis.dropped_keys.is_empty() {
        warn!(keys = ?analysis.dropped_keys, "keys missing from the first record were dropped");
    }
    for failure in &analysis.report.failures {
        warn!(section = ?failure.section, column = ?failure.column, reason = %failure.reason, "profile section incomplete");
    }

    if summary {
        println!(
            "{} {} ({}, {} rows)",
            "Profile of".cyan().bold(),
            file.display().to_string().white(),
            analysis.source.format,
            analysis.source.row_count
        );
        println!();
        super::print_summary(&analysis.report.result, &analysis.report.failures);
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&analysis.report.result)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "{} {}",
                "Wrote profile to".green(),
                path.display().to_string().white()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
