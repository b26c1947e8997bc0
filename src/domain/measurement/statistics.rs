//! Outlier-robust reduction of frame intervals into rate metrics.
//!
//! Quartiles use linear interpolation between closest ranks (`h = (n - 1) * q`),
//! the same definition for per-iteration filtering and for cross-iteration
//! variability.

use serde::{Deserialize, Serialize};

/// Below this many samples statistics are reported as insufficient.
pub const MIN_SAMPLES: usize = 10;
/// Tukey fence multiplier.
pub const IQR_FACTOR: f64 = 1.5;
/// Cross-iteration variability falls back to the plain range below this count.
pub const MIN_POINTS_FOR_QUARTILES: usize = 4;

/// Sorts a copy of `values` ascending. NaNs sort last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Interpolated quantile of an already sorted slice; `q` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Median of an unsorted slice; averages the middle pair for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Frames per second equivalent of an interval.
fn rate(interval_ms: f64) -> f64 {
    if interval_ms > 0.0 { 1_000.0 / interval_ms } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn of(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        Some(Self { q1: quantile_sorted(&sorted, 0.25)?, q3: quantile_sorted(&sorted, 0.75)? })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Inclusive `[Q1 - k*IQR, Q3 + k*IQR]`.
    pub fn fences(&self, factor: f64) -> (f64, f64) {
        let spread = factor * self.iqr();
        (self.q1 - spread, self.q3 + spread)
    }
}

/// Result of IQR filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSamples {
    pub kept: Vec<f64>,
    pub excluded: usize,
    /// The filter left too few points and the raw set was used instead.
    pub fell_back: bool,
}

/// Per-iteration metrics. Rates are rounded to integers, intervals to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntervalMetrics {
    pub mean_fps: f64,
    pub median_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub mean_interval_ms: f64,
    pub median_interval_ms: f64,
    pub jitter_ms: f64,
    pub raw_samples: usize,
    pub used_samples: usize,
    pub outliers_excluded: usize,
    pub insufficient_data: bool,
}

impl IntervalMetrics {
    /// Zero-metric shape for sample sets too small to trust.
    pub fn insufficient(raw_samples: usize) -> Self {
        Self { raw_samples, insufficient_data: true, ..Self::default() }
    }
}

/// Cross-iteration reduction for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedMetrics {
    pub median_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub jitter_ms: f64,
    /// IQR of per-iteration medians, or their range with fewer than 4 iterations.
    pub variability_fps: f64,
    pub outliers_excluded: usize,
    pub iterations: usize,
    pub insufficient_iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReducer {
    pub min_samples: usize,
    pub iqr_factor: f64,
}

impl Default for StatisticsReducer {
    fn default() -> Self {
        Self { min_samples: MIN_SAMPLES, iqr_factor: IQR_FACTOR }
    }
}

impl StatisticsReducer {
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples, ..Self::default() }
    }

    /// Drops samples outside the Tukey fences, keeping the original order.
    pub fn filter_outliers(&self, samples: &[f64]) -> FilteredSamples {
        let Some(quartiles) = Quartiles::of(samples) else {
            return FilteredSamples { kept: Vec::new(), excluded: 0, fell_back: false };
        };
        let (lower, upper) = quartiles.fences(self.iqr_factor);
        let kept: Vec<f64> =
            samples.iter().copied().filter(|v| *v >= lower && *v <= upper).collect();

        if kept.len() < self.min_samples {
            return FilteredSamples { kept: samples.to_vec(), excluded: 0, fell_back: true };
        }
        let excluded = samples.len() - kept.len();
        FilteredSamples { kept, excluded, fell_back: false }
    }

    pub fn reduce(&self, samples: &[f64]) -> IntervalMetrics {
        if samples.len() < self.min_samples {
            return IntervalMetrics::insufficient(samples.len());
        }

        let filtered = self.filter_outliers(samples);
        let values = &filtered.kept;
        let n = values.len() as f64;

        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let ordered = sorted(values);
        let median_interval = quantile_sorted(&ordered, 0.5).unwrap_or(mean);
        let shortest = ordered.first().copied().unwrap_or(mean);
        let longest = ordered.last().copied().unwrap_or(mean);

        IntervalMetrics {
            mean_fps: rate(mean).round(),
            median_fps: rate(median_interval).round(),
            min_fps: rate(longest).round(),
            max_fps: rate(shortest).round(),
            mean_interval_ms: round_to(mean, 2),
            median_interval_ms: round_to(median_interval, 2),
            jitter_ms: round_to(variance.sqrt(), 2),
            raw_samples: samples.len(),
            used_samples: values.len(),
            outliers_excluded: filtered.excluded,
            insufficient_data: false,
        }
    }

    /// Degenerate iterations take part like any other, dragging the numbers down.
    pub fn combine(&self, iterations: &[IntervalMetrics]) -> CombinedMetrics {
        if iterations.is_empty() {
            return CombinedMetrics::default();
        }

        let medians: Vec<f64> = iterations.iter().map(|m| m.median_fps).collect();
        let jitters: Vec<f64> = iterations.iter().map(|m| m.jitter_ms).collect();
        let ordered_medians = sorted(&medians);

        let variability = if iterations.len() < MIN_POINTS_FOR_QUARTILES {
            ordered_medians.last().copied().unwrap_or_default()
                - ordered_medians.first().copied().unwrap_or_default()
        } else {
            Quartiles::of(&medians).map(|q| q.iqr()).unwrap_or_default()
        };

        CombinedMetrics {
            median_fps: quantile_sorted(&ordered_medians, 0.5).unwrap_or_default().round(),
            min_fps: iterations.iter().map(|m| m.min_fps).fold(f64::INFINITY, f64::min),
            max_fps: iterations.iter().map(|m| m.max_fps).fold(f64::NEG_INFINITY, f64::max),
            jitter_ms: round_to(median(&jitters).unwrap_or_default(), 2),
            variability_fps: round_to(variability, 2),
            outliers_excluded: iterations.iter().map(|m| m.outliers_excluded).sum(),
            iterations: iterations.len(),
            insufficient_iterations: iterations.iter().filter(|m| m.insufficient_data).count(),
        }
    }
}
