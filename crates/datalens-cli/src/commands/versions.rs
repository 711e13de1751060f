//! Dataset and version listing, and activation.

use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

use datalens::{Dataset, DatasetState, DatasetVersion};

use crate::cli::Settings;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Serialize)]
struct DatasetListing<'a> {
    #[serde(flatten)]
    dataset: &'a Dataset,
    state: DatasetState,
}

#[derive(Serialize)]
struct VersionListing<'a> {
    #[serde(flatten)]
    version: &'a DatasetVersion,
    active: bool,
    profiled: bool,
}

pub fn list_datasets(settings: &Settings, json_output: bool) -> CommandResult {
    let pipeline = super::open_pipeline(settings)?;
    let versions = pipeline.versions();

    let datasets = versions.list_datasets()?;
    let mut listings = Vec::with_capacity(datasets.len());
    for dataset in &datasets {
        listings.push(DatasetListing {
            dataset,
            state: versions.state(dataset.id)?,
        });
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    if listings.is_empty() {
        println!("No datasets in {}", settings.store.display());
        return Ok(());
    }

    for listing in &listings {
        let state = match listing.state {
            DatasetState::Empty => "empty".dimmed().to_string(),
            DatasetState::HasVersions { latest } => format!("{} versions, none active", latest),
            DatasetState::Active {
                version_number,
                latest,
            } => format!("v{} of {} active", version_number, latest)
                .green()
                .to_string(),
        };
        println!(
            "{}  {:24} {}",
            listing.dataset.id,
            listing.dataset.name.white().bold(),
            state
        );
    }

    Ok(())
}

pub fn list_versions(settings: &Settings, dataset_id: Uuid, json_output: bool) -> CommandResult {
    let pipeline = super::open_pipeline(settings)?;
    let versions = pipeline.versions();

    let dataset = versions.get_dataset(dataset_id)?;
    let all = versions.list_versions(dataset_id)?;
    let listings: Vec<VersionListing> = all
        .iter()
        .map(|version| VersionListing {
            version,
            active: dataset.active_version_id == Some(version.id),
            profiled: versions.get_profile(version.id).is_ok(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Versions of".cyan().bold(),
        dataset.name.white(),
        dataset.id
    );
    println!();

    for listing in &listings {
        let version = listing.version;
        let marker = if listing.active { "*".green().bold() } else { " ".normal() };
        let source = version.source_id.as_deref().unwrap_or(&version.source_type);
        println!(
            "{} v{:<3} {}  {}  {:>7} rows  {:>3} cols  {}{}",
            marker,
            version.version_number,
            version.id,
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.row_count,
            version.column_count,
            source,
            if listing.profiled { "" } else { "  (not profiled)" }
        );
    }

    Ok(())
}

pub fn activate(settings: &Settings, dataset_id: Uuid, version_id: Uuid) -> CommandResult {
    let pipeline = super::open_pipeline(settings)?;
    let versions = pipeline.versions();

    let version = versions.get_version(version_id)?;
    let dataset = versions.activate_version(dataset_id, version_id)?;

    println!(
        "{} v{} of {}",
        "Activated".green().bold(),
        version.version_number,
        dataset.name.white()
    );
    Ok(())
}
