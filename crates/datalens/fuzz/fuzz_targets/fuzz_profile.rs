//! Fuzz target for inference and profiling.
//!
//! Cells come from the fuzzer directly, so extreme numbers, NaN-like text
//! and malformed dates reach every statistic. Profiling must never panic
//! and must always return all five sections.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use datalens::{Profiler, RawRow, RawValue, SchemaInferrer};

#[derive(Debug, Arbitrary)]
enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<Cell> for RawValue {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Null => RawValue::Null,
            Cell::Bool(b) => RawValue::Bool(b),
            Cell::Number(n) => RawValue::Number(n),
            Cell::Text(s) => RawValue::Text(s),
        }
    }
}

fuzz_target!(|table: Vec<[Cell; 3]>| {
    if table.len() > 2_000 {
        return;
    }

    let columns: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let rows: Vec<RawRow> = table
        .into_iter()
        .map(|cells| {
            columns
                .iter()
                .cloned()
                .zip(cells.into_iter().map(RawValue::from))
                .collect()
        })
        .collect();

    let schema = SchemaInferrer::new().infer(&columns, &rows);
    let report = Profiler::new().profile(&rows, &schema);

    assert_eq!(report.result.overview.row_count, rows.len());
    assert_eq!(report.result.distributions.len(), columns.len());
});
