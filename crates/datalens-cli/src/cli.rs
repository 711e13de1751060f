//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use datalens::profile::CorrelationMethod;
use std::path::PathBuf;
use uuid::Uuid;

/// Datalens: typed, versioned datasets and statistical profiles
#[derive(Parser)]
#[command(name = "datalens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: Settings,
}

/// Options shared by every command.
#[derive(Args, Clone, Debug)]
pub struct Settings {
    /// Directory holding stored objects and the dataset catalog
    #[arg(long, global = true, default_value = ".datalens")]
    pub store: PathBuf,

    /// Pipeline configuration file (JSON); flags below override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of histogram bins for numeric columns
    #[arg(long, global = true)]
    pub bins: Option<usize>,

    /// Number of most frequent values kept per categorical column
    #[arg(long, global = true)]
    pub top_n: Option<usize>,

    /// Correlation method (pearson, spearman)
    #[arg(long, global = true)]
    pub method: Option<CorrelationMethod>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse, infer and profile a file without storing anything
    Profile {
        /// Path to the data file (CSV/TSV, XLSX or JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the profile JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Store a file as the next version of a dataset and profile it
    Ingest {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dataset ID, or "new" to create a dataset
        #[arg(short, long, default_value = "new")]
        dataset: DatasetTarget,

        /// Name for a newly created dataset (default: file stem)
        #[arg(long)]
        name: Option<String>,

        /// Make the new version the active one
        #[arg(long)]
        activate: bool,

        /// Skip the profiling job
        #[arg(long)]
        no_profile: bool,
    },

    /// List datasets in the store
    Datasets {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the versions of a dataset
    Versions {
        /// Dataset ID
        #[arg(value_name = "DATASET")]
        dataset: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Make a version the active one (including rolling back)
    Activate {
        /// Dataset ID
        #[arg(value_name = "DATASET")]
        dataset: Uuid,

        /// Version ID
        #[arg(id = "version_id", value_name = "VERSION")]
        version: Uuid,
    },

    /// Print the stored profile of a version
    Show {
        /// Version ID
        #[arg(id = "version_id", value_name = "VERSION")]
        version: Uuid,

        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
}

/// Where an ingested file goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetTarget {
    New,
    Existing(Uuid),
}

impl std::str::FromStr for DatasetTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("new") {
            return Ok(DatasetTarget::New);
        }
        s.parse::<Uuid>()
            .map(DatasetTarget::Existing)
            .map_err(|_| format!("Invalid dataset: {}. Use a dataset ID or \"new\".", s))
    }
}
