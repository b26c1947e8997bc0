use super::statistics::{CombinedMetrics, IntervalMetrics};
use super::value_objects::TimingDiagnostics;
use crate::domain::backend::BackendId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of the test matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Configuration {
    pub backend: BackendId,
    pub size: usize,
}

impl Configuration {
    pub fn new(backend: BackendId, size: usize) -> Self {
        Self { backend, size }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.backend, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    pub configuration: Configuration,
    pub iteration: usize,
    pub metrics: IntervalMetrics,
    pub warmup_ticks: usize,
    pub rejected_samples: usize,
    pub diagnostics: TimingDiagnostics,
}

impl IterationResult {
    pub fn is_suspect(&self) -> bool {
        self.diagnostics.is_suspect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub configuration: Configuration,
    pub metrics: CombinedMetrics,
    pub diagnostics: TimingDiagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationResults {
    pub configuration: Configuration,
    pub iterations: Vec<IterationResult>,
    pub combined: Option<CombinedResult>,
}

/// Raised when a measurement was disturbed by throttling or a hidden page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementWarning {
    pub configuration: Configuration,
    pub iteration: usize,
    pub throttle_gaps: usize,
    pub hidden_ticks: usize,
    pub max_gap_ms: f64,
}

impl fmt::Display for MeasurementWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iteration {}: {} throttled gaps, {} hidden ticks, max gap {:.1} ms",
            self.configuration,
            self.iteration + 1,
            self.throttle_gaps,
            self.hidden_ticks,
            self.max_gap_ms
        )
    }
}

/// Points for one chart line: workload size against combined median rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub backend: BackendId,
    pub label: String,
    pub points: Vec<(usize, f64)>,
}

/// Everything a run produced, in matrix order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsStore {
    entries: Vec<ConfigurationResults>,
    warnings: Vec<MeasurementWarning>,
}

impl ResultsStore {
    /// Empty slots for every configuration of the matrix.
    pub fn for_matrix(configurations: &[Configuration]) -> Self {
        Self {
            entries: configurations
                .iter()
                .map(|&configuration| ConfigurationResults {
                    configuration,
                    iterations: Vec::new(),
                    combined: None,
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    fn slot_mut(&mut self, configuration: Configuration) -> &mut ConfigurationResults {
        match self.entries.iter().position(|e| e.configuration == configuration) {
            Some(index) => &mut self.entries[index],
            None => {
                self.entries.push(ConfigurationResults {
                    configuration,
                    iterations: Vec::new(),
                    combined: None,
                });
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        }
    }

    pub fn record_iteration(&mut self, result: IterationResult) {
        let slot = self.slot_mut(result.configuration);
        slot.iterations.push(result);
        slot.iterations.sort_by_key(|r| r.iteration);
    }

    pub fn record_combined(&mut self, result: CombinedResult) {
        let configuration = result.configuration;
        self.slot_mut(configuration).combined = Some(result);
    }

    pub fn record_warning(&mut self, warning: MeasurementWarning) {
        self.warnings.push(warning);
    }

    pub fn get(&self, configuration: Configuration) -> Option<&ConfigurationResults> {
        self.entries.iter().find(|e| e.configuration == configuration)
    }

    pub fn combined(&self, configuration: Configuration) -> Option<&CombinedResult> {
        self.get(configuration).and_then(|e| e.combined.as_ref())
    }

    pub fn entries(&self) -> &[ConfigurationResults] {
        &self.entries
    }

    pub fn warnings(&self) -> &[MeasurementWarning] {
        &self.warnings
    }

    pub fn iteration_count(&self) -> usize {
        self.entries.iter().map(|e| e.iterations.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.combined.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.warnings.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.warnings.clear();
    }

    /// One series per backend, sizes ascending, configurations without a
    /// combined result left out.
    pub fn chart_series(&self) -> Vec<ChartSeries> {
        let mut series: Vec<ChartSeries> = Vec::new();
        for entry in &self.entries {
            let Some(combined) = &entry.combined else { continue };
            let backend = entry.configuration.backend;
            let point = (entry.configuration.size, combined.metrics.median_fps);
            match series.iter_mut().find(|s| s.backend == backend) {
                Some(existing) => existing.points.push(point),
                None => series.push(ChartSeries {
                    backend,
                    label: backend.display_name().to_string(),
                    points: vec![point],
                }),
            }
        }
        for s in &mut series {
            s.points.sort_by_key(|(size, _)| *size);
        }
        series.sort_by_key(|s| s.backend);
        series
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combined(backend: BackendId, size: usize, fps: f64) -> CombinedResult {
        CombinedResult {
            configuration: Configuration::new(backend, size),
            metrics: CombinedMetrics { median_fps: fps, iterations: 3, ..Default::default() },
            diagnostics: TimingDiagnostics::default(),
        }
    }

    #[test]
    fn chart_series_groups_by_backend() {
        let configs = [
            Configuration::new(BackendId::MapLibre, 5_000),
            Configuration::new(BackendId::Leaflet, 500),
            Configuration::new(BackendId::MapLibre, 500),
        ];
        let mut store = ResultsStore::for_matrix(&configs);
        store.record_combined(combined(BackendId::MapLibre, 5_000, 41.0));
        store.record_combined(combined(BackendId::MapLibre, 500, 60.0));

        let series = store.chart_series();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "MapLibre GL");
        assert_eq!(series[0].points, vec![(500, 60.0), (5_000, 41.0)]);
        assert!(!store.is_complete());
    }

    #[test]
    fn combined_lands_on_its_configuration() {
        let fast = Configuration::new(BackendId::DeckGl, 500);
        let slow = Configuration::new(BackendId::DeckGl, 10_000);
        let mut store = ResultsStore::for_matrix(&[fast, slow]);

        store.record_combined(combined(BackendId::DeckGl, 10_000, 22.0));
        store.record_combined(combined(BackendId::DeckGl, 10_000, 24.0));

        assert!(store.combined(fast).is_none());
        assert_eq!(store.combined(slow).map(|c| c.metrics.median_fps), Some(24.0));
        assert_eq!(store.entries().len(), 2);
    }

    #[test]
    fn iterations_stay_sorted() {
        let config = Configuration::new(BackendId::Leaflet, 500);
        let mut store = ResultsStore::for_matrix(&[config]);
        for iteration in [2, 0, 1] {
            store.record_iteration(IterationResult {
                configuration: config,
                iteration,
                metrics: IntervalMetrics::default(),
                warmup_ticks: 0,
                rejected_samples: 0,
                diagnostics: TimingDiagnostics::default(),
            });
        }
        let order: Vec<usize> =
            store.get(config).unwrap().iterations.iter().map(|r| r.iteration).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
