//! Ingest command - store a file as a new dataset version and profile it.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use datalens::{JobStatus, ProfilingJobs, SourceRef};
use tracing::{info, warn};

use crate::cli::{DatasetTarget, Settings};

pub fn run(
    settings: &Settings,
    file: PathBuf,
    dataset: DatasetTarget,
    name: Option<String>,
    activate: bool,
    no_profile: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let pipeline = Arc::new(super::open_pipeline(settings)?);
    let versions = pipeline.versions();

    let dataset = match dataset {
        DatasetTarget::Existing(id) => versions.get_dataset(id)?,
        DatasetTarget::New => {
            let name = name.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "dataset".to_string())
            });
            let dataset = versions.create_dataset(name)?;
            println!(
                "{} {} ({})",
                "Created dataset".green(),
                dataset.name.white().bold(),
                dataset.id
            );
            dataset
        }
    };

    let bytes = std::fs::read(&file)?;
    let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned());
    let source = SourceRef::upload(file_name.clone().unwrap_or_default());
    let ingestion = pipeline.ingest(dataset.id, &bytes, file_name.as_deref(), source)?;
    let version = &ingestion.version;

    if !ingestion.dropped_keys.is_empty() {
        warn!(keys = ?ingestion.dropped_keys, "keys missing from the first record were dropped");
    }
    println!(
        "{} v{} ({}) of {}: {} rows, {} columns",
        "Stored".green().bold(),
        version.version_number,
        version.id,
        dataset.name.white(),
        version.row_count,
        version.column_count
    );

    if activate {
        versions.activate_version(dataset.id, version.id)?;
        println!("{} v{}", "Activated".green(), version.version_number);
    }

    if no_profile {
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let status = runtime.block_on(async {
        let jobs = ProfilingJobs::new(Arc::clone(&pipeline));
        let handle = jobs.submit(version.id);
        info!(job = %handle.job_id(), "profiling submitted");

        // Ctrl+C cancels the job; the version stays stored without a profile
        tokio::select! {
            status = handle.wait() => status,
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                handle.wait().await
            }
        }
    });

    match status {
        JobStatus::Completed { failures: 0 } => {
            let profile = versions.get_profile(version.id)?;
            println!(
                "{} quality score {:.1}",
                "Profiled:".green().bold(),
                profile.profile.quality_summary.score
            );
        }
        JobStatus::Completed { failures } => {
            println!(
                "{} {} section(s) could not be computed; run 'datalens show {} --summary'",
                "Profiled with gaps:".yellow().bold(),
                failures,
                version.id
            );
        }
        JobStatus::Cancelled => println!("{}", "Profiling cancelled".yellow()),
        JobStatus::Failed { reason } => {
            return Err(format!("Profiling failed: {}", reason).into());
        }
        JobStatus::Pending | JobStatus::Running => {}
    }

    Ok(())
}
