//! Daily price statistics
//!
//! Descriptive statistics over one day's hourly price series, including the
//! operator's fixed peak/off-peak tariff windows.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Off-peak window 1: hours 0-7
pub const OFF_PEAK_1_HOURS: Range<usize> = 0..8;

/// Peak window: hours 8-19
pub const PEAK_HOURS: Range<usize> = 8..20;

/// Start of off-peak window 2 (hours 20 to end of day)
pub const OFF_PEAK_2_START: usize = 20;

/// Midday window used for geometric/harmonic means: hours 10-17
pub const MIDDAY_HOURS: Range<usize> = 10..18;

/// Statistics derived from one day's hourly price series
///
/// `median` is published under the attribute key `mean` and `average` under
/// `average`, matching the wire names of the original integration. Windowed
/// statistics are `None` when the series does not reach into the window
/// (short days around DST transitions or truncated publications).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    /// Arithmetic mean over the whole day
    pub average: f64,

    /// Lowest hourly price
    pub min: f64,

    /// Highest hourly price
    pub max: f64,

    /// Median hourly price
    pub median: f64,

    /// Mean over hours 0-7
    pub off_peak_1: Option<f64>,

    /// Mean over hours 20 to end of day
    pub off_peak_2: Option<f64>,

    /// Mean over hours 8-19
    pub peak: Option<f64>,

    /// Geometric mean over hours 10-17. Undefined for zero or negative
    /// prices; not guarded, per the underlying operation.
    pub geometric_mean: Option<f64>,

    /// Harmonic mean over hours 10-17, same caveat as the geometric mean
    pub harmonic_mean: Option<f64>,
}

impl DayStats {
    /// Compute statistics for a day's price series; `None` for an empty series
    pub fn compute(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            average: mean(prices),
            min,
            max,
            median: median(prices),
            off_peak_1: window_mean(prices, OFF_PEAK_1_HOURS),
            off_peak_2: window_mean(prices, OFF_PEAK_2_START..prices.len()),
            peak: window_mean(prices, PEAK_HOURS),
            geometric_mean: window(prices, MIDDAY_HOURS).map(geometric_mean),
            harmonic_mean: window(prices, MIDDAY_HOURS).map(harmonic_mean),
        })
    }
}

/// Arithmetic mean of a non-empty slice
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a non-empty slice
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Geometric mean of a non-empty slice
fn geometric_mean(values: &[f64]) -> f64 {
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    (log_sum / values.len() as f64).exp()
}

/// Harmonic mean of a non-empty slice
fn harmonic_mean(values: &[f64]) -> f64 {
    let reciprocal_sum: f64 = values.iter().map(|v| 1.0 / v).sum();
    values.len() as f64 / reciprocal_sum
}

/// Slice a window clamped to the series length; `None` when empty
fn window(values: &[f64], range: Range<usize>) -> Option<&[f64]> {
    let start = range.start.min(values.len());
    let end = range.end.min(values.len());
    let slice = &values[start..end];
    if slice.is_empty() { None } else { Some(slice) }
}

/// Mean over a clamped window; `None` when the window is empty
fn window_mean(values: &[f64], range: Range<usize>) -> Option<f64> {
    window(values, range).map(mean)
}
