use crate::application::config::MeasurementConfig;
use crate::domain::backend::RenderBackend;
use crate::domain::clock::{CancellationToken, FrameClock};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::logging::LogComponent;
use crate::domain::measurement::{Sample, SampleSet};
use crate::domain::workload::{AnimationBuffer, Workload};
use crate::log_trace;

/// Shortest frame period the sample buffer is sized for (120 Hz).
const MIN_EXPECTED_FRAME_MS: u32 = 8;

/// Timer readings are kept at microsecond resolution.
fn quantize_ms(ms: f64) -> f64 {
    (ms * 1_000.0).round() / 1_000.0
}

/// Use Case: one fixed-duration frame-interval measurement.
///
/// Each tick pushes an animated copy of the workload into the backend, so the
/// interval between ticks reflects how well the backend keeps up with
/// position churn.
pub struct CollectSamplesUseCase<'a> {
    config: &'a MeasurementConfig,
    cancel: &'a CancellationToken,
}

impl<'a> CollectSamplesUseCase<'a> {
    pub fn new(config: &'a MeasurementConfig, cancel: &'a CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub async fn execute<C>(
        &self,
        clock: &mut C,
        backend: &mut dyn RenderBackend,
        workload: &Workload,
        buffer: &mut AnimationBuffer,
    ) -> BenchResult<SampleSet>
    where
        C: FrameClock + ?Sized,
    {
        let warmup_ms = f64::from(self.config.warmup_ms);
        let total_ms = self.config.total_ms();
        let capacity = (self.config.duration_ms / MIN_EXPECTED_FRAME_MS) as usize;
        let mut samples = SampleSet::with_capacity(capacity);

        let start = clock.now();
        let mut last_tick = start;

        loop {
            if self.cancel.is_cancelled() {
                return Err(BenchError::Cancelled);
            }
            let now = clock.next_frame().await?;
            if self.cancel.is_cancelled() {
                return Err(BenchError::Cancelled);
            }

            let interval = quantize_ms(now - last_tick);
            last_tick = now;
            let elapsed = now - start;

            samples.diagnostics.record(
                interval,
                self.config.throttle_threshold_ms,
                clock.is_hidden(),
            );
            let sample = Sample::classify(interval, elapsed, warmup_ms);
            samples.push(sample, &self.config.plausibility);

            if elapsed >= total_ms {
                break;
            }

            workload.animate_into((elapsed / 1_000.0) as f32, buffer);
            backend.update_positions(buffer.positions())?;
        }

        log_trace!(
            LogComponent::Measurement("Collector"),
            "{} samples kept, {} warmup, {} rejected, max gap {:.1} ms",
            samples.len(),
            samples.warmup_ticks,
            samples.rejected,
            samples.diagnostics.max_gap_ms
        );
        Ok(samples)
    }
}
