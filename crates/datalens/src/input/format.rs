//! Supported upload formats and detection.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// ZIP local-file header; every XLSX workbook starts with it.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    Csv,
    Xlsx,
    Json,
}

impl DataFormat {
    /// Map a file extension to a format.
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(DataFormat::Csv),
            "xlsx" | "xlsm" => Some(DataFormat::Xlsx),
            "json" => Some(DataFormat::Json),
            _ => None,
        }
    }

    /// Guess the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            return DataFormat::Xlsx;
        }

        let first = bytes
            .strip_prefix(b"\xEF\xBB\xBF")
            .unwrap_or(bytes)
            .iter()
            .find(|b| !b.is_ascii_whitespace());

        match first {
            Some(b'{') | Some(b'[') => DataFormat::Json,
            _ => DataFormat::Csv,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Xlsx => "xlsx",
            DataFormat::Json => "json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
