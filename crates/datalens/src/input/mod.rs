//! Format parsers: raw bytes into ordered columns and untyped records.

mod format;
mod json;
mod parser;
mod source;
mod value;
mod xlsx;

pub use format::DataFormat;
pub use json::WRAPPER_KEYS;
pub use parser::{Parser, ParserConfig};
pub use source::{content_hash, ParsedDataset, SourceMetadata};
pub use value::{RawRow, RawValue, ValueKey};
