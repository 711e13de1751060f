//! Show command - print the stored profile of a version.

use colored::Colorize;
use datalens::LensError;
use uuid::Uuid;

use crate::cli::Settings;

pub fn run(
    settings: &Settings,
    version_id: Uuid,
    summary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::open_pipeline(settings)?;
    let versions = pipeline.versions();

    let version = versions.get_version(version_id)?;
    let stored = match versions.get_profile(version_id) {
        Ok(stored) => stored,
        Err(LensError::NotFound { .. }) => {
            return Err(format!(
                "Version {} has no profile yet.\nRun 'datalens ingest' without --no-profile, or re-ingest the file.",
                version_id
            )
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    if !summary {
        println!("{}", serde_json::to_string_pretty(&stored.profile)?);
        return Ok(());
    }

    let dataset = versions.get_dataset(version.dataset_id)?;
    println!(
        "{} {} v{} ({})",
        "Profile of".cyan().bold(),
        dataset.name.white(),
        version.version_number,
        version.id
    );
    println!(
        "  computed {} with {}",
        stored.computed_at.format("%Y-%m-%d %H:%M:%S"),
        stored.algorithm_version
    );
    println!();
    super::print_summary(&stored.profile, &stored.failures);

    Ok(())
}
