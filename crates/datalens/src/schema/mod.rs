//! Schema types for representing inferred dataset structure.

mod column;
mod table;
mod types;

pub use column::ColumnSchema;
pub use table::DatasetSchema;
pub use types::InferredType;
