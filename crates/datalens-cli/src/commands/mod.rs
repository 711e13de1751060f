//! CLI command implementations.

pub mod ingest;
pub mod profile;
pub mod show;
pub mod versions;

use std::error::Error;
use std::sync::Arc;

use colored::Colorize;
use datalens::profile::{Distribution, SectionFailure};
use datalens::storage::LocalDiskStore;
use datalens::versioning::FileMetadataStore;
use datalens::{Pipeline, PipelineConfig, ProfileResult};

use crate::cli::Settings;

/// Build the pipeline configuration: file first, then flag overrides.
pub fn pipeline_config(settings: &Settings) -> Result<PipelineConfig, Box<dyn Error>> {
    let mut config = match &settings.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(bins) = settings.bins {
        config.profile = config.profile.with_bins(bins);
    }
    if let Some(top_n) = settings.top_n {
        config.profile = config.profile.with_top_n(top_n);
    }
    if let Some(method) = settings.method {
        config.profile = config.profile.with_method(method);
    }

    Ok(config)
}

/// Open the pipeline over the store directory: objects under `objects/`,
/// records in `catalog.json`.
pub fn open_pipeline(settings: &Settings) -> Result<Pipeline, Box<dyn Error>> {
    let config = pipeline_config(settings)?;
    let objects = LocalDiskStore::new(settings.store.join("objects"))?;
    let metadata = FileMetadataStore::open(settings.store.join("catalog.json"))?;

    Ok(Pipeline::new(config, Arc::new(objects), Arc::new(metadata)))
}

/// Human-readable rendering of a profile.
pub fn print_summary(result: &ProfileResult, failures: &[SectionFailure]) {
    let overview = &result.overview;
    println!("{}", "Overview:".yellow().bold());
    println!(
        "  {} rows, {} columns, {} missing cells ({:.2}%), {} duplicate rows",
        overview.row_count.to_string().white().bold(),
        overview.column_count.to_string().white().bold(),
        overview.missing_cells,
        overview.missing_ratio,
        overview.duplicate_row_count
    );
    println!();

    println!("{}", "Columns:".yellow().bold());
    for (name, distribution) in &result.distributions {
        let ty = overview
            .column_types
            .get(name)
            .map(|t| t.to_string())
            .unwrap_or_default();
        let detail = match distribution {
            Distribution::Histogram(h) => format!(
                "mean={:.3} median={:.3} range=[{}, {}]",
                h.summary.mean, h.summary.median, h.summary.min, h.summary.max
            ),
            Distribution::Frequency(f) => format!(
                "distinct={} top={}",
                f.distinct_count,
                f.top_value.as_deref().unwrap_or("-")
            ),
            Distribution::Temporal(t) => format!("{} .. {} ({} days)", t.min, t.max, t.range_days),
        };

        let outliers = result.outliers.get(name).map_or(0, |o| o.count);
        if outliers > 0 {
            println!(
                "  {:20} {:8} {} {}",
                name,
                ty,
                detail,
                format!("{} outliers", outliers).red()
            );
        } else {
            println!("  {:20} {:8} {}", name, ty, detail);
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
        println!("{}", "Strong correlations:".yellow().bold());
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

    let quality = &result.quality_summary;
    let score = format!("{:.1}", quality.score);
    let score = if quality.score >= 90.0 {
        score.green()
    } else if quality.score >= 70.0 {
        score.yellow()
    } else {
        score.red()
    };
    println!("{} {}", "Quality score:".yellow().bold(), score.bold());
    for hint in &quality.hints {
        println!("  - {}", hint.message);
    }
    println!("  {}", quality.recommendation.white());

    if !failures.is_empty() {
        println!();
        println!("{}", "Incomplete:".red().bold());
        for failure in failures {
            let column = failure.column.as_deref().unwrap_or("*");
            println!("  {:?} [{}]: {}", failure.section, column, failure.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalens::profile::CorrelationMethod;
    use std::path::PathBuf;

    fn settings() -> Settings {
        Settings {
            store: PathBuf::from(".datalens"),
            config: None,
            bins: None,
            top_n: None,
            method: None,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = Settings {
            bins: Some(0),
            top_n: Some(3),
            method: Some(CorrelationMethod::Spearman),
            ..settings()
        };
        let config = pipeline_config(&settings).unwrap();

        assert_eq!(config.profile.histogram_bins, 1);
        assert_eq!(config.profile.top_n, 3);
        assert_eq!(config.profile.correlation_method, CorrelationMethod::Spearman);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let settings = Settings {
            config: Some(PathBuf::from("/nonexistent/datalens.json")),
            ..settings()
        };
        assert!(pipeline_config(&settings).is_err());
    }
}
