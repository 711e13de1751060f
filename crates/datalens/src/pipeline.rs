//! The pipeline facade: parse, infer, profile, version.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{LensError, Result};
use crate::inference::SchemaInferrer;
use crate::input::{ParsedDataset, Parser, ParserConfig, SourceMetadata};
use crate::jobs::CancelToken;
use crate::profile::{ProfileConfig, ProfileReport, Profiler};
use crate::schema::DatasetSchema;
use crate::storage::{MemoryObjectStore, ObjectStore, RetryPolicy, RetryingStore};
use crate::versioning::{
    DatasetVersion, InMemoryMetadataStore, MetadataStore, SourceRef, VersionManager,
    VersionProfile,
};

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Profiling configuration.
    pub profile: ProfileConfig,
    /// Retry policy for object-store operations.
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LensError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Result of a one-shot analysis that is not versioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub source: SourceMetadata,
    pub dropped_keys: Vec<String>,
    pub schema: DatasetSchema,
    pub report: ProfileReport,
}

/// Result of ingesting a file as a new dataset version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingestion {
    pub version: DatasetVersion,
    pub source: SourceMetadata,
    pub dropped_keys: Vec<String>,
}

/// Parser, inferrer, profiler and version manager, wired together.
pub struct Pipeline {
    config: PipelineConfig,
    parser: Parser,
    inferrer: SchemaInferrer,
    profiler: Profiler,
    versions: Arc<VersionManager>,
}

impl Pipeline {
    /// Build a pipeline over the given stores. Object-store calls are
    /// retried according to `config.retry`.
    pub fn new(
        config: PipelineConfig,
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let objects: Arc<dyn ObjectStore> =
            Arc::new(RetryingStore::new(objects, config.retry.clone()));
        let versions = Arc::new(VersionManager::new(objects, metadata));

        Self {
            parser: Parser::with_config(config.parser.clone()),
            inferrer: SchemaInferrer::new(),
            profiler: Profiler::with_config(config.profile.clone()),
            versions,
            config,
        }
    }

    /// A pipeline whose stores live only in memory.
    pub fn in_memory(config: PipelineConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryObjectStore::new()),
            Arc::new(InMemoryMetadataStore::new()),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn versions(&self) -> &Arc<VersionManager> {
        &self.versions
    }

    /// Parse and infer, without profiling or storing anything.
    pub fn parse_and_infer(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<(ParsedDataset, DatasetSchema)> {
        let parsed = self.parser.parse_auto(bytes, file_name)?;
        let schema = self.inferrer.infer(&parsed.columns, &parsed.rows);
        Ok((parsed, schema))
    }

    /// Parse, infer and profile bytes in one pass. Nothing is stored.
    pub fn analyze_bytes(&self, bytes: &[u8], file_name: Option<&str>) -> Result<Analysis> {
        let (parsed, schema) = self.parse_and_infer(bytes, file_name)?;
        let report = self.profiler.profile(&parsed.rows, &schema);

        Ok(Analysis {
            source: parsed.source,
            dropped_keys: parsed.dropped_keys,
            schema,
            report,
        })
    }

    /// Parse, infer and profile a file on disk. Nothing is stored.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<Analysis> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LensError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.file_name().and_then(|n| n.to_str());
        self.analyze_bytes(&bytes, name)
    }

    /// Parse and infer bytes, then persist them as the next version of a
    /// dataset. A parse failure creates no version. Profiling is left to
    /// [`profile_version`](Self::profile_version) or a job.
    pub fn ingest(
        &self,
        dataset_id: Uuid,
        bytes: &[u8],
        file_name: Option<&str>,
        source: SourceRef,
    ) -> Result<Ingestion> {
        let (parsed, schema) = self.parse_and_infer(bytes, file_name)?;
        let version = self.versions.create_version(
            dataset_id,
            &parsed.columns,
            &parsed.rows,
            &schema,
            source,
        )?;

        info!(
            dataset = %dataset_id,
            version = version.version_number,
            format = %parsed.format,
            "ingested file"
        );
        Ok(Ingestion {
            version,
            source: parsed.source,
            dropped_keys: parsed.dropped_keys,
        })
    }

    /// Profile the rows persisted under a version and attach the result.
    ///
    /// Reads exactly the artifact stored for `version_id`.
    pub fn profile_version(&self, version_id: Uuid, cancel: &CancelToken) -> Result<VersionProfile> {
        let version = self.versions.get_version(version_id)?;
        cancel.check()?;

        let artifact = self.versions.load_rows(version_id)?;
        let report = self
            .profiler
            .profile_cancellable(&artifact.rows, &version.schema, cancel)?;
        self.versions.attach_profile(version_id, &report)
    }

    /// Like [`profile_version`](Self::profile_version), but the version must
    /// belong to `dataset_id`.
    pub fn profile_version_in(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        cancel: &CancelToken,
    ) -> Result<VersionProfile> {
        self.versions.version_in(dataset_id, version_id)?;
        self.profile_version(version_id, cancel)
    }
}
