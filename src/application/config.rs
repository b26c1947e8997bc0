use crate::domain::backend::BackendId;
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::measurement::{Configuration, PlausibilityWindow, MIN_SAMPLES};
use crate::domain::workload::Bounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

pub const DEFAULT_SIZES: [usize; 4] = [500, 1_000, 5_000, 10_000];
pub const DEFAULT_ITERATIONS: usize = 3;
pub const DEFAULT_WARMUP_MS: u32 = 2_000;
pub const DEFAULT_DURATION_MS: u32 = 10_000;
pub const DEFAULT_SETTLE_MS: u32 = 500;
pub const DEFAULT_COOLDOWN_MS: u32 = 300;
pub const DEFAULT_WORKLOAD_SEED: u64 = 42;
pub const DEFAULT_THROTTLE_THRESHOLD_MS: f64 = 100.0;

/// Timing parameters of a single measurement loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub warmup_ms: u32,
    pub duration_ms: u32,
    pub throttle_threshold_ms: f64,
    pub plausibility: PlausibilityWindow,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            warmup_ms: DEFAULT_WARMUP_MS,
            duration_ms: DEFAULT_DURATION_MS,
            throttle_threshold_ms: DEFAULT_THROTTLE_THRESHOLD_MS,
            plausibility: PlausibilityWindow::default(),
        }
    }
}

impl MeasurementConfig {
    pub fn total_ms(&self) -> f64 {
        f64::from(self.warmup_ms) + f64::from(self.duration_ms)
    }
}

/// Full run configuration. Every field has a default, so a partial JSON
/// object only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub backends: Vec<BackendId>,
    pub sizes: Vec<usize>,
    pub iterations: usize,
    pub measurement: MeasurementConfig,
    pub settle_ms: u32,
    pub cooldown_ms: u32,
    pub workload_seed: u64,
    pub bounds: Bounds,
    pub min_samples: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            backends: BackendId::iter().collect(),
            sizes: DEFAULT_SIZES.to_vec(),
            iterations: DEFAULT_ITERATIONS,
            measurement: MeasurementConfig::default(),
            settle_ms: DEFAULT_SETTLE_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            workload_seed: DEFAULT_WORKLOAD_SEED,
            bounds: Bounds::default(),
            min_samples: MIN_SAMPLES,
        }
    }
}

impl BenchmarkConfig {
    pub fn from_json(json: &str) -> BenchResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BenchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BenchResult<()> {
        let invalid = |msg: &str| -> BenchResult<()> { Err(BenchError::InvalidConfig(msg.to_string())) };
        if self.backends.is_empty() {
            return invalid("at least one backend is required");
        }
        if has_duplicates(&self.backends) {
            return invalid("backends must not repeat");
        }
        if self.sizes.is_empty() || self.sizes.contains(&0) {
            return invalid("workload sizes must be positive and non-empty");
        }
        if has_duplicates(&self.sizes) {
            return invalid("workload sizes must not repeat");
        }
        if self.iterations == 0 {
            return invalid("iterations must be positive");
        }
        if self.measurement.duration_ms == 0 {
            return invalid("measurement duration must be positive");
        }
        let window = self.measurement.plausibility;
        if window.min_interval_ms >= window.max_interval_ms {
            return invalid("plausibility window is empty");
        }
        if !self.bounds.is_valid() {
            return invalid("workload bounds are degenerate");
        }
        if self.min_samples == 0 {
            return invalid("minimum sample count must be positive");
        }
        Ok(())
    }

    /// Backend-major cross product, before any shuffling.
    pub fn matrix(&self) -> Vec<Configuration> {
        self.backends
            .iter()
            .flat_map(|&backend| self.sizes.iter().map(move |&size| Configuration::new(backend, size)))
            .collect()
    }

    pub fn total_tests(&self) -> usize {
        self.backends.len() * self.sizes.len() * self.iterations
    }
}

fn has_duplicates<T: Ord>(items: &[T]) -> bool {
    let mut seen = BTreeSet::new();
    items.iter().any(|item| !seen.insert(item))
}
