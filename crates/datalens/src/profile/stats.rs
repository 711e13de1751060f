//! Numeric helpers shared by the profiling sections.
//!
//! Everything here is exact and deterministic: quantiles come from a full
//! sort, never from sampling, so a profile reproduces bit-for-bit.

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

// =============================================================================
// STREAMING MOMENTS
// =============================================================================
// Welford's online algorithm for mean and variance in a single pass.

#[derive(Debug, Clone, Default)]
struct Moments {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Moments {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        }
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Sample variance (ddof = 1).
    fn sample_variance(&self) -> Option<f64> {
        (self.count >= 2).then(|| self.m2 / (self.count - 1) as f64)
    }
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values or
    /// when the variance overflows.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Population skewness; `None` for zero variance or when not finite.
    pub skewness: Option<f64>,
    /// Excess kurtosis; `None` for zero variance or when not finite.
    pub kurtosis: Option<f64>,
}

/// Summarize a set of finite values.
pub fn summarize(values: &[f64]) -> Result<NumericSummary, ProfileError> {
    if values.is_empty() {
        return Err(ProfileError::Empty("numeric summary"));
    }

    let mut moments = Moments::default();
    for &value in values {
        moments.add(value);
    }
    let mean = finite("mean", moments.mean)?;
    let std = moments
        .sample_variance()
        .map(f64::sqrt)
        .filter(|s| s.is_finite());

    let sorted = sorted(values);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = finite("iqr", q3 - q1)?;

    let (skewness, kurtosis) = shape(values, mean);

    Ok(NumericSummary {
        count: moments.count,
        mean,
        std,
        min: moments.min,
        max: moments.max,
        median,
        q1,
        q3,
        iqr,
        skewness,
        kurtosis,
    })
}

/// Population skewness and excess kurtosis about `mean`.
///
/// Deviations are standardized before they are raised to powers, so the
/// moments stay finite for any magnitude the mean itself survives.
fn shape(values: &[f64], mean: f64) -> (Option<f64>, Option<f64>) {
    let n = values.len() as f64;

    let scale = values.iter().map(|v| (v - mean).abs()).fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return (None, None);
    }
    let scaled_variance = values
        .iter()
        .map(|v| ((v - mean) / scale).powi(2))
        .sum::<f64>()
        / n;
    let sigma = scale * scaled_variance.sqrt();
    if sigma == 0.0 || !sigma.is_finite() {
        return (None, None);
    }

    let (mut m3, mut m4) = (0.0, 0.0);
    for &value in values {
        let z = (value - mean) / sigma;
        let z2 = z * z;
        m3 += z2 * z;
        m4 += z2 * z2;
    }

    let skewness = m3 / n;
    let kurtosis = m4 / n - 3.0;
    (
        skewness.is_finite().then_some(skewness),
        kurtosis.is_finite().then_some(kurtosis),
    )
}

/// Copy and sort values ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile `p` in [0, 1] of sorted values, with linear interpolation.
pub fn quantile(sorted: &[f64], p: f64) -> Result<f64, ProfileError> {
    let last = match sorted.len() {
        0 => return Err(ProfileError::Empty("quantile")),
        n => n - 1,
    };

    let position = p.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Ok(sorted[lower]);
    }

    let weight = position - lower as f64;
    finite(
        "quantile",
        sorted[lower] + (sorted[upper] - sorted[lower]) * weight,
    )
}

/// Ranks (1-based) with ties sharing their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson coefficient of paired observations.
///
/// `None` with fewer than two pairs or when either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<Option<f64>, ProfileError> {
    let n = xs.len().min(ys.len());
    if n < 2 || is_constant(&xs[..n]) || is_constant(&ys[..n]) {
        return Ok(None);
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Ok(None);
    }

    let r = finite("correlation", sxy / (sxx * syy).sqrt())?;
    Ok(Some(r.clamp(-1.0, 1.0)))
}

/// Whether every value equals the first.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

/// Shannon entropy (bits) of a frequency distribution.
pub fn entropy(counts: impl IntoIterator<Item = usize>) -> f64 {
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    let h: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum();
    // A single category gives -0.0
    h.max(0.0)
}

fn finite(statistic: &'static str, value: f64) -> Result<f64, ProfileError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProfileError::NonFinite { statistic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summary_basic() {
        let summary = summarize(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(summary.count, 5);
        assert!(approx(summary.mean, 3.0));
        assert!(approx(summary.std.unwrap(), 2.5f64.sqrt()));
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.iqr, 2.0);
        assert!(approx(summary.skewness.unwrap(), 0.0));
        assert!(approx(summary.kurtosis.unwrap(), -1.3));
    }

    #[test]
    fn test_summary_single_and_constant() {
        let single = summarize(&[7.0]).unwrap();
        assert_eq!(single.std, None);
        assert_eq!(single.skewness, None);

        let constant = summarize(&[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(constant.std, Some(0.0));
        assert_eq!(constant.kurtosis, None);
        assert_eq!(constant.iqr, 0.0);
    }

    #[test]
    fn test_summary_shape_at_large_magnitudes() {
        let summary = summarize(&[0.0, 1e80, 2e80, 3e80]).unwrap();

        assert!(approx(summary.skewness.unwrap(), 0.0));
        assert!(approx(summary.kurtosis.unwrap(), -1.36));
        assert!(summary.std.is_some_and(f64::is_finite));

        // Variance overflows, the rest of the summary survives
        let summary = summarize(&[0.0, 1e200, 2e200]).unwrap();
        assert_eq!(summary.std, None);
        assert!(summary.skewness.is_some());
        assert_eq!(summary.median, 1e200);
    }

    #[test]
    fn test_summary_empty_and_overflow() {
        assert_eq!(summarize(&[]), Err(ProfileError::Empty("numeric summary")));
        assert!(matches!(
            summarize(&[f64::MAX, -f64::MAX, f64::MAX]),
            Err(ProfileError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5).unwrap(), 2.5);
        assert_eq!(quantile(&sorted, 0.25).unwrap(), 1.75);
        assert_eq!(quantile(&sorted, 1.0).unwrap(), 4.0);
    }

    #[test]
    fn test_average_ranks() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap().unwrap();
        assert!(approx(r, 1.0));

        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap().unwrap();
        assert!(approx(r, -1.0));
    }

    #[test]
    fn test_pearson_undefined() {
        assert_eq!(pearson(&[1.0], &[2.0]).unwrap(), None);
        assert_eq!(pearson(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0]).unwrap(), None);
    }

    #[test]
    fn test_entropy() {
        assert_eq!(entropy([4]), 0.0);
        assert!(approx(entropy([1, 1]), 1.0));
        assert!(approx(entropy([1, 1, 1, 1]), 2.0));
        assert_eq!(entropy(Vec::new()), 0.0);
    }
}
