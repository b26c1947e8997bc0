use futures::executor::block_on;
use render_bench_wasm::application::config::MeasurementConfig;
use render_bench_wasm::application::use_cases::CollectSamplesUseCase;
use render_bench_wasm::domain::backend::{BackendId, RenderBackend};
use render_bench_wasm::domain::clock::CancellationToken;
use render_bench_wasm::domain::errors::BenchError;
use render_bench_wasm::domain::measurement::{SampleSet, StatisticsReducer};
use render_bench_wasm::domain::workload::{AnimationBuffer, Workload, WorkloadGenerator};
use render_bench_wasm::infrastructure::headless::{FaultPoint, HeadlessBackend, SimulatedFrameClock};

fn measurement(warmup_ms: u32, duration_ms: u32) -> MeasurementConfig {
    MeasurementConfig { warmup_ms, duration_ms, ..MeasurementConfig::default() }
}

fn workload(size: usize) -> Workload {
    WorkloadGenerator::default().generate(size, 42).unwrap()
}

fn collect(
    config: &MeasurementConfig,
    clock: &mut SimulatedFrameClock,
    backend: &mut HeadlessBackend,
    token: &CancellationToken,
) -> Result<SampleSet, BenchError> {
    collect_sized(64, config, clock, backend, token)
}

fn collect_sized(
    size: usize,
    config: &MeasurementConfig,
    clock: &mut SimulatedFrameClock,
    backend: &mut HeadlessBackend,
    token: &CancellationToken,
) -> Result<SampleSet, BenchError> {
    let workload = workload(size);
    backend.load_workload(&workload).unwrap();
    let mut buffer = AnimationBuffer::new();
    block_on(CollectSamplesUseCase::new(config, token).execute(clock, backend, &workload, &mut buffer))
}

#[test]
fn warmup_ticks_never_reach_statistics() {
    let config = measurement(100, 1_000);
    let mut clock = SimulatedFrameClock::constant(20.0);
    let mut backend = HeadlessBackend::new(BackendId::Leaflet);
    let journal = backend.journal();

    let samples = collect(&config, &mut clock, &mut backend, &CancellationToken::new()).unwrap();

    // ticks at 20..=100 ms are warmup, 120..=1100 ms are measured
    assert_eq!(samples.warmup_ticks, 5);
    assert_eq!(samples.len(), 50);
    assert_eq!(samples.rejected, 0);
    assert!(samples.intervals_ms.iter().all(|&i| i == 20.0));
    assert_eq!(samples.diagnostics.total_ticks, 55);
    assert!(!samples.diagnostics.is_suspect());

    // the terminating tick pushes no update
    let journal = journal.borrow();
    assert_eq!(journal.updates, 54);
    assert_eq!(journal.mismatched_updates, 0);
    assert_eq!(clock.frames(), 55);
}

#[test]
fn constant_sixty_hertz_reduces_cleanly() {
    let config = MeasurementConfig::default();
    let mut clock = SimulatedFrameClock::constant(16.67);
    let mut backend = HeadlessBackend::new(BackendId::OpenLayers);
    let journal = backend.journal();

    let samples = collect_sized(500, &config, &mut clock, &mut backend, &CancellationToken::new()).unwrap();
    let metrics = StatisticsReducer::default().reduce(&samples.intervals_ms);

    assert_eq!(journal.borrow().loaded_len, 500);
    assert_eq!(samples.warmup_ticks, 119);
    assert_eq!(metrics.median_fps, 60.0);
    assert_eq!(metrics.mean_fps, 60.0);
    assert_eq!(metrics.jitter_ms, 0.0);
    assert_eq!(metrics.outliers_excluded, 0);
}

#[test]
fn implausible_gaps_are_rejected_and_flagged() {
    let config = measurement(0, 1_650);
    let mut clock = SimulatedFrameClock::with_intervals(&[20.0, 20.0, 20.0, 20.0, 250.0]);
    let mut backend = HeadlessBackend::new(BackendId::MapLibre);

    let samples = collect(&config, &mut clock, &mut backend, &CancellationToken::new()).unwrap();

    assert_eq!(samples.diagnostics.total_ticks, 25);
    assert_eq!(samples.rejected, 5);
    assert_eq!(samples.len(), 20);
    assert_eq!(samples.diagnostics.throttle_gaps, 5);
    assert_eq!(samples.diagnostics.max_gap_ms, 250.0);
    assert!(samples.diagnostics.is_suspect());
}

#[test]
fn hidden_page_ticks_are_counted() {
    let config = measurement(0, 200);
    let mut clock = SimulatedFrameClock::constant(20.0);
    clock.set_hidden(true);
    let mut backend = HeadlessBackend::new(BackendId::DeckGl);

    let samples = collect(&config, &mut clock, &mut backend, &CancellationToken::new()).unwrap();
    assert_eq!(samples.diagnostics.hidden_ticks, 10);
    assert_eq!(samples.diagnostics.throttle_gaps, 0);
    assert!(samples.diagnostics.is_suspect());
}

#[test]
fn cancellation_stops_within_one_tick() {
    let config = measurement(100, 10_000);
    let mut clock = SimulatedFrameClock::constant(16.0);
    let token = CancellationToken::new();
    let trigger = token.clone();
    clock.at_frame(12, move || trigger.cancel());
    let mut backend = HeadlessBackend::new(BackendId::Leaflet);
    let journal = backend.journal();

    let outcome = collect(&config, &mut clock, &mut backend, &token);

    assert_eq!(outcome, Err(BenchError::Cancelled));
    assert_eq!(clock.frames(), 12);
    assert_eq!(journal.borrow().updates, 11);
}

#[test]
fn pre_cancelled_token_never_waits_for_a_frame() {
    let config = measurement(100, 1_000);
    let mut clock = SimulatedFrameClock::constant(16.0);
    let token = CancellationToken::new();
    token.cancel();
    let mut backend = HeadlessBackend::new(BackendId::Leaflet);

    let outcome = collect(&config, &mut clock, &mut backend, &token);
    assert!(outcome.unwrap_err().is_cancelled());
    assert_eq!(clock.frames(), 0);
}

#[test]
fn backend_fault_aborts_the_loop() {
    let config = measurement(0, 1_000);
    let mut clock = SimulatedFrameClock::constant(20.0);
    let mut backend = HeadlessBackend::new(BackendId::OpenLayers).failing_at(FaultPoint::Update(3));

    let outcome = collect(&config, &mut clock, &mut backend, &CancellationToken::new());

    match outcome {
        Err(BenchError::Backend { backend, .. }) => assert_eq!(backend, BackendId::OpenLayers),
        other => panic!("expected backend fault, got {:?}", other),
    }
    assert_eq!(clock.frames(), 3);
}

#[test]
fn slow_updates_lower_the_frame_rate() {
    let config = measurement(100, 1_000);
    let mut clock = SimulatedFrameClock::constant(20.0);
    // 64 entities at 500 us each: 32 ms of work per frame
    let mut backend = HeadlessBackend::new(BackendId::Leaflet).with_cost(clock.clone(), 500.0);

    let samples = collect(&config, &mut clock, &mut backend, &CancellationToken::new()).unwrap();
    let metrics = StatisticsReducer::default().reduce(&samples.intervals_ms);

    assert_eq!(metrics.median_interval_ms, 40.0);
    assert_eq!(metrics.median_fps, 25.0);
}
