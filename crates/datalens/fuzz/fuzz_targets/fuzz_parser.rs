//! Fuzz target for the upload parser.
//!
//! This fuzzer tests that parsing:
//! 1. Never panics on malformed input, in any of the three formats
//! 2. Never yields a row whose keys differ from the column list

#![no_main]

use libfuzzer_sys::fuzz_target;
use datalens::{DataFormat, Parser};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    for format in [DataFormat::Csv, DataFormat::Json, DataFormat::Xlsx] {
        if let Ok(parsed) = parser.parse(data, format) {
            for row in &parsed.rows {
                assert!(row.keys().eq(parsed.columns.iter()));
            }
        }
    }

    let _ = parser.parse_auto(data, None);
});
