//! Per-column value distributions.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::inference::round2;
use crate::input::{RawValue, ValueKey};

use super::stats::{self, NumericSummary};

/// Distribution of one column, shaped by its inferred type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Numeric columns.
    Histogram(Histogram),
    /// String and boolean columns.
    Frequency(FrequencyTable),
    /// Date columns.
    Temporal(TemporalSummary),
}

/// Equal-width histogram over the observed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub summary: NumericSummary,
}

/// One histogram bin. Bins are half-open except the last, which is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Most frequent values of a column, with the remainder grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyTable {
    /// Non-missing values counted.
    pub total: usize,
    pub distinct_count: usize,
    pub top_value: Option<String>,
    /// Top entries, by count descending then value ascending.
    pub entries: Vec<FrequencyEntry>,
    /// Summed count of every value beyond the top entries.
    pub other: usize,
    /// Shannon entropy (bits) of the full table.
    pub entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    /// Share of non-missing values, 2 dp.
    pub percentage: f64,
}

/// Range of a date column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalSummary {
    pub count: usize,
    pub min: NaiveDate,
    pub max: NaiveDate,
    pub range_days: i64,
}

/// Build a histogram of `values` with `bins` equal-width bins.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram, ProfileError> {
    let summary = stats::summarize(values)?;
    let (min, max) = (summary.min, summary.max);

    if min == max {
        return Ok(Histogram {
            bins: vec![HistogramBin {
                lower: min,
                upper: max,
                count: values.len(),
            }],
            summary,
        });
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    if !width.is_finite() || width == 0.0 {
        return Err(ProfileError::NonFinite {
            statistic: "bin width",
        });
    }

    let mut counts = vec![0usize; bins];
    for &value in values {
        let index = (((value - min) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: if i + 1 == bins { max } else { min + (i + 1) as f64 * width },
            count,
        })
        .collect();

    Ok(Histogram { bins, summary })
}

/// Build a frequency table over the non-missing values.
pub fn frequency<'a>(
    values: impl IntoIterator<Item = &'a RawValue>,
    top_n: usize,
) -> FrequencyTable {
    let mut counts: IndexMap<ValueKey, (String, usize)> = IndexMap::new();
    for value in values {
        if !value.is_missing() {
            counts
                .entry(value.key())
                .or_insert_with(|| (value.to_string(), 0))
                .1 += 1;
        }
    }

    let total: usize = counts.values().map(|(_, count)| count).sum();
    let distinct_count = counts.len();
    let entropy = stats::entropy(counts.values().map(|(_, count)| *count));

    let mut ranked: Vec<(String, usize)> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let other = ranked.iter().skip(top_n).map(|(_, count)| count).sum();
    let top_value = ranked.first().map(|(value, _)| value.clone());
    let entries = ranked
        .into_iter()
        .take(top_n)
        .map(|(value, count)| FrequencyEntry {
            value,
            count,
            percentage: round2(count as f64 / total as f64 * 100.0),
        })
        .collect();

    FrequencyTable {
        total,
        distinct_count,
        top_value,
        entries,
        other,
        entropy,
    }
}

/// Summarize the date range of a column.
pub fn temporal(dates: &[NaiveDate]) -> Result<TemporalSummary, ProfileError> {
    let (Some(&min), Some(&max)) = (dates.iter().min(), dates.iter().max()) else {
        return Err(ProfileError::Empty("date range"));
    };

    Ok(TemporalSummary {
        count: dates.len(),
        min,
        max,
        range_days: (max - min).num_days(),
    })
}
