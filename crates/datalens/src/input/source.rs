//! Parsed dataset and source metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::format::DataFormat;
use super::value::{RawRow, RawValue};

/// Metadata about the uploaded bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// Original file name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// SHA-256 hash of the raw bytes.
    pub hash: String,
    /// Size of the raw bytes.
    pub size_bytes: u64,
    /// Detected format.
    pub format: DataFormat,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the bytes were parsed.
    pub parsed_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for bytes that have been parsed.
    pub fn new(
        bytes: &[u8],
        format: DataFormat,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        Self {
            file: None,
            hash: content_hash(bytes),
            size_bytes: bytes.len() as u64,
            format,
            row_count,
            column_count,
            parsed_at: Utc::now(),
        }
    }

    /// Attach the original file name.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// `sha256:<hex>` digest of a byte buffer.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Output of a parser: ordered columns and row-oriented records.
#[derive(Debug, Clone)]
pub struct ParsedDataset {
    /// Column names in first-observed order.
    pub columns: Vec<String>,
    /// Records; every row carries every column.
    pub rows: Vec<RawRow>,
    /// Format the bytes were read as.
    pub format: DataFormat,
    /// Keys seen only after the first JSON record (not part of the schema).
    pub dropped_keys: Vec<String>,
    /// Metadata about the source bytes.
    pub source: SourceMetadata,
}

impl ParsedDataset {
    pub(crate) fn new(
        bytes: &[u8],
        format: DataFormat,
        columns: Vec<String>,
        rows: Vec<RawRow>,
    ) -> Self {
        let source = SourceMetadata::new(bytes, format, rows.len(), columns.len());
        Self {
            columns,
            rows,
            format,
            dropped_keys: Vec::new(),
            source,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get all values for a column, `Null` where a row lacks it.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawValue> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&RawValue::NULL))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&RawValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// Make header names usable as unique row keys.
///
/// Blank names become `column_{n}`; repeats get `_2`, `_3`, ... suffixes.
pub(crate) fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers: Vec<String> = Vec::new();

    for (idx, name) in raw.into_iter().enumerate() {
        let trimmed = name.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while headers.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        headers.push(candidate);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let hash = content_hash(b"abc");
        assert_eq!(
            hash,
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_normalize_headers() {
        let headers = normalize_headers(["id", "", "name", "id", "id", " "]);
        assert_eq!(
            headers,
            vec!["id", "column_2", "name", "id_2", "id_3", "column_6"]
        );
    }
}
