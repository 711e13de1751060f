//! Example: Profile a tabular data file with datalens.
//!
//! Usage:
//!   cargo run --example analyze -- <file_path>
//!
//! Example:
//!   cargo run --example analyze -- sales.csv

use std::env;
use std::path::Path;

use datalens::profile::Distribution;
use datalens::{Pipeline, PipelineConfig};

fn main() -> datalens::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example analyze -- <file_path>");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Profile: {}", file_path);
    println!("{}", separator);
    println!();

    let pipeline = Pipeline::in_memory(PipelineConfig::default());
    let analysis = pipeline.analyze_file(path)?;
    let result = &analysis.report.result;

    println!("## Source");
    println!("  Format: {}", analysis.source.format);
    println!("  Rows: {}", analysis.source.row_count);
    println!("  Columns: {}", analysis.source.column_count);
    if !analysis.dropped_keys.is_empty() {
        println!("  Dropped keys: {}", analysis.dropped_keys.join(", "));
    }
    println!();

    println!("## Schema ({} columns)", analysis.schema.column_count);
    println!();
    for col in &analysis.schema.columns {
        println!(
            "  {:20} {:8} nulls={:<6.2}% distinct={:<6} consistency={:.2}%",
            col.name, col.inferred_type, col.null_ratio, col.cardinality, col.type_consistency
        );
    }
    println!();

    println!("## Distributions");
    println!();
    for (name, distribution) in &result.distributions {
        match distribution {
            Distribution::Histogram(h) => println!(
                "  {:20} mean={:.3} median={:.3} min={} max={}",
                name, h.summary.mean, h.summary.median, h.summary.min, h.summary.max
            ),
            Distribution::Frequency(f) => println!(
                "  {:20} distinct={} top={}",
                name,
                f.distinct_count,
                f.top_value.as_deref().unwrap_or("-")
            ),
            Distribution::Temporal(t) => {
                println!("  {:20} {} .. {} ({} days)", name, t.min, t.max, t.range_days)
            }
        }
    }
    println!();

    let strong: Vec<_> = result
        .correlations
        .pairs
        .iter()
        .filter(|p| p.coefficient.is_some_and(|r| r.abs() >= 0.7))
        .collect();
    if !strong.is_empty() {
        println!("## Strong correlations");
        for pair in strong {
            println!(
                "  {} ~ {}: {:.3}",
                pair.left,
                pair.right,
                pair.coefficient.unwrap_or_default()
            );
        }
        println!();
    }

    println!("## Quality");
    println!("  Score: {:.1}", result.quality_summary.score);
    for hint in &result.quality_summary.hints {
        println!("  - {}", hint.message);
    }
    println!("  Recommendation: {}", result.quality_summary.recommendation);

    if !analysis.report.is_complete() {
        println!();
        println!("## Incomplete sections");
        for failure in &analysis.report.failures {
            println!("  {:?} {:?}: {}", failure.section, failure.column, failure.reason);
        }
    }

    println!("{}", separator);

    Ok(())
}
