use serde::{Deserialize, Serialize};

/// Which part of the measurement window a tick fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Warmup,
    Measurement,
}

/// One inter-tick interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub interval_ms: f64,
    pub phase: Phase,
}

impl Sample {
    /// Ticks at or before `warmup_ms` of elapsed wall time are warmup.
    pub fn classify(interval_ms: f64, elapsed_ms: f64, warmup_ms: f64) -> Self {
        let phase = if elapsed_ms <= warmup_ms { Phase::Warmup } else { Phase::Measurement };
        Self { interval_ms, phase }
    }
}

/// Bounds separating real frame intervals from instrumentation noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityWindow {
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
}

impl Default for PlausibilityWindow {
    fn default() -> Self {
        Self { min_interval_ms: 1.0, max_interval_ms: 200.0 }
    }
}

impl PlausibilityWindow {
    /// Both ends are exclusive.
    pub fn accepts(&self, interval_ms: f64) -> bool {
        interval_ms > self.min_interval_ms && interval_ms < self.max_interval_ms
    }
}

/// Scheduling-interference counters gathered over every tick, warmup included.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingDiagnostics {
    pub total_ticks: usize,
    pub max_gap_ms: f64,
    pub throttle_gaps: usize,
    pub hidden_ticks: usize,
}

impl TimingDiagnostics {
    pub fn record(&mut self, interval_ms: f64, throttle_threshold_ms: f64, hidden: bool) {
        self.total_ticks += 1;
        if interval_ms > self.max_gap_ms {
            self.max_gap_ms = interval_ms;
        }
        if interval_ms > throttle_threshold_ms {
            self.throttle_gaps += 1;
        }
        if hidden {
            self.hidden_ticks += 1;
        }
    }

    /// Throttled or hidden ticks mean the numbers should not be trusted blindly.
    pub fn is_suspect(&self) -> bool {
        self.throttle_gaps > 0 || self.hidden_ticks > 0
    }

    pub fn merge(&mut self, other: &TimingDiagnostics) {
        self.total_ticks += other.total_ticks;
        self.max_gap_ms = self.max_gap_ms.max(other.max_gap_ms);
        self.throttle_gaps += other.throttle_gaps;
        self.hidden_ticks += other.hidden_ticks;
    }
}

/// Output of one measurement loop. Warmup ticks never enter `intervals_ms`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleSet {
    pub intervals_ms: Vec<f64>,
    pub warmup_ticks: usize,
    pub rejected: usize,
    pub diagnostics: TimingDiagnostics,
}

impl SampleSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { intervals_ms: Vec::with_capacity(capacity), ..Self::default() }
    }

    /// Routes a classified sample; returns whether it was kept for statistics.
    pub fn push(&mut self, sample: Sample, window: &PlausibilityWindow) -> bool {
        match sample.phase {
            Phase::Warmup => {
                self.warmup_ticks += 1;
                false
            }
            Phase::Measurement if window.accepts(sample.interval_ms) => {
                self.intervals_ms.push(sample.interval_ms);
                true
            }
            Phase::Measurement => {
                self.rejected += 1;
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.intervals_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals_ms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_boundary_is_inclusive() {
        assert_eq!(Sample::classify(16.0, 2_000.0, 2_000.0).phase, Phase::Warmup);
        assert_eq!(Sample::classify(16.0, 2_000.1, 2_000.0).phase, Phase::Measurement);
    }

    #[test]
    fn implausible_intervals_are_rejected() {
        let window = PlausibilityWindow::default();
        let mut set = SampleSet::default();
        assert!(!set.push(Sample { interval_ms: 1.0, phase: Phase::Measurement }, &window));
        assert!(!set.push(Sample { interval_ms: 200.0, phase: Phase::Measurement }, &window));
        assert!(set.push(Sample { interval_ms: 16.7, phase: Phase::Measurement }, &window));
        assert!(!set.push(Sample { interval_ms: 16.7, phase: Phase::Warmup }, &window));
        assert_eq!((set.len(), set.rejected, set.warmup_ticks), (1, 2, 1));
    }

    #[test]
    fn diagnostics_count_throttle_gaps() {
        let mut diag = TimingDiagnostics::default();
        diag.record(16.0, 100.0, false);
        diag.record(150.0, 100.0, false);
        diag.record(100.0, 100.0, true);
        assert_eq!(diag.total_ticks, 3);
        assert_eq!(diag.throttle_gaps, 1);
        assert_eq!(diag.hidden_ticks, 1);
        assert!((diag.max_gap_ms - 150.0).abs() < f64::EPSILON);
        assert!(diag.is_suspect());
    }
}
