//! Datalens CLI - profile uploads and manage dataset versions.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = &cli.settings;
    let result = match cli.command {
        Commands::Profile {
            file,
            output,
            summary,
        } => commands::profile::run(settings, file, output, summary),

        Commands::Ingest {
            file,
            dataset,
            name,
            activate,
            no_profile,
        } => commands::ingest::run(settings, file, dataset, name, activate, no_profile),

        Commands::Datasets { json } => commands::versions::list_datasets(settings, json),

        Commands::Versions { dataset, json } => {
            commands::versions::list_versions(settings, dataset, json)
        }

        Commands::Activate { dataset, version } => {
            commands::versions::activate(settings, dataset, version)
        }

        Commands::Show { version, summary } => commands::show::run(settings, version, summary),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
