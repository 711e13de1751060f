//! JSON reader: arrays of records, wrapped arrays, or a single record.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{LensError, Result};
use super::format::DataFormat;
use super::value::{RawRow, RawValue};

/// Keys that may wrap the record array, tried in this order.
pub const WRAPPER_KEYS: &[&str] = &[
    "rawData",
    "data",
    "results",
    "rows",
    "preprocessedData",
    "items",
];

/// Records read from a JSON document.
pub(super) struct JsonDocument {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    pub dropped_keys: Vec<String>,
}

pub(super) fn read_json(bytes: &[u8]) -> Result<JsonDocument> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| LensError::parse(DataFormat::Json, e.to_string()))?;

    let records: Vec<&Map<String, Value>> = match &root {
        Value::Array(items) => as_records(items)?,
        Value::Object(object) => match unwrap_records(object) {
            Some(items) => as_records(items)?,
            None => vec![object],
        },
        other => {
            return Err(LensError::parse(
                DataFormat::Json,
                format!("expected an array or object at top level, found {}", kind(other)),
            ));
        }
    };

    // The first record defines the column list
    let columns: Vec<String> = records
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();

    let mut dropped_keys: Vec<String> = Vec::new();
    let rows: Vec<RawRow> = records
        .iter()
        .map(|record| {
            for key in record.keys() {
                if !columns.contains(key) && !dropped_keys.contains(key) {
                    dropped_keys.push(key.clone());
                }
            }
            columns
                .iter()
                .map(|name| {
                    let value = record.get(name).map(RawValue::from).unwrap_or(RawValue::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect();

    if !dropped_keys.is_empty() {
        warn!(
            keys = ?dropped_keys,
            "keys absent from the first JSON record are not part of the schema"
        );
    }

    Ok(JsonDocument {
        columns,
        rows,
        dropped_keys,
    })
}

/// First wrapper key holding a non-empty array.
fn unwrap_records(object: &Map<String, Value>) -> Option<&Vec<Value>> {
    WRAPPER_KEYS.iter().find_map(|key| match object.get(*key) {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    })
}

fn as_records(items: &[Value]) -> Result<Vec<&Map<String, Value>>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(LensError::parse(
                DataFormat::Json,
                format!("element {} is {}, expected an object", idx, kind(other)),
            )),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
