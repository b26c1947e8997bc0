use crate::application::config::BenchmarkConfig;
use crate::application::scheduler::{ScheduledTest, TestScheduler};
use crate::application::use_cases::collect_samples::CollectSamplesUseCase;
use crate::domain::backend::{BackendRegistry, Layer, RenderBackend};
use crate::domain::clock::{CancellationToken, FrameClock};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::events::{summarize, BenchmarkEvent, BenchmarkProgress, EventDispatcher, InMemoryEventDispatcher};
use crate::domain::logging::{get_logger, LogComponent, LogLevel};
use crate::domain::measurement::{
    CombinedResult, Configuration, IterationResult, MeasurementWarning, ResultsStore,
    StatisticsReducer, TimingDiagnostics,
};
use crate::domain::state::RunState;
use crate::domain::workload::{AnimationBuffer, WorkloadCache, WorkloadGenerator};
use crate::{log_debug, log_error, log_info, log_warn};
use std::cell::RefCell;
use std::rc::Rc;

/// State readable while a run is in flight.
#[derive(Debug, Default)]
pub struct RunStatus {
    pub state: RunState,
    pub results: ResultsStore,
}

/// Cheap clonable view used to cancel or inspect a run from outside.
#[derive(Debug, Clone)]
pub struct BenchmarkHandle {
    status: Rc<RefCell<RunStatus>>,
    cancel: CancellationToken,
}

impl BenchmarkHandle {
    /// Requests cooperative cancellation. No-op unless a run is active.
    pub fn cancel(&self) {
        if self.state() == RunState::Running {
            log_info!(LogComponent::Scheduler("Orchestrator"), "cancellation requested");
            self.cancel.cancel();
        }
    }

    pub fn state(&self) -> RunState {
        self.status.borrow().state
    }

    pub fn results(&self) -> ResultsStore {
        self.status.borrow().results.clone()
    }
}

/// Use Case: execute the full backend × size × iteration matrix.
pub struct BenchmarkOrchestrator<C: FrameClock> {
    config: BenchmarkConfig,
    clock: C,
    backends: BackendRegistry,
    workloads: WorkloadCache,
    scratch: AnimationBuffer,
    scheduler: TestScheduler,
    reducer: StatisticsReducer,
    events: InMemoryEventDispatcher,
    status: Rc<RefCell<RunStatus>>,
    cancel: CancellationToken,
}

impl<C: FrameClock> BenchmarkOrchestrator<C> {
    /// `shuffle_seed` drives test ordering only; workloads always use
    /// `config.workload_seed`.
    pub fn new(config: BenchmarkConfig, clock: C, shuffle_seed: u64) -> BenchResult<Self> {
        config.validate()?;
        let generator = WorkloadGenerator::new(config.bounds)?;
        Ok(Self {
            workloads: WorkloadCache::new(generator, config.workload_seed),
            reducer: StatisticsReducer::new(config.min_samples),
            scheduler: TestScheduler::new(shuffle_seed),
            config,
            clock,
            backends: BackendRegistry::new(),
            scratch: AnimationBuffer::new(),
            events: InMemoryEventDispatcher::new(),
            status: Rc::new(RefCell::new(RunStatus::default())),
            cancel: CancellationToken::new(),
        })
    }

    pub fn register_backend(&mut self, backend: Box<dyn RenderBackend>) {
        log_debug!(LogComponent::Scheduler("Orchestrator"), "registered backend {}", backend.id());
        self.backends.register(backend);
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&BenchmarkEvent) + 'static,
    {
        self.events.subscribe(handler);
    }

    pub fn handle(&self) -> BenchmarkHandle {
        BenchmarkHandle { status: Rc::clone(&self.status), cancel: self.cancel.clone() }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> RunState {
        self.status.borrow().state
    }

    pub fn results(&self) -> ResultsStore {
        self.status.borrow().results.clone()
    }

    /// Back to idle with an empty store and no scratch memory held.
    pub fn reset(&mut self) -> BenchResult<()> {
        {
            let mut status = self.status.borrow_mut();
            status.state.transition(RunState::Idle)?;
            status.results.clear();
        }
        self.scratch.release();
        self.cancel.reset();
        Ok(())
    }

    /// Enters `Running` with an empty store and a fresh cancellation token.
    /// Cancels issued after this call are honoured by the next `run`.
    pub fn start(&mut self) -> BenchResult<()> {
        {
            let mut status = self.status.borrow_mut();
            status.state.transition(RunState::Running)?;
            status.results = ResultsStore::for_matrix(&self.config.matrix());
        }
        self.cancel.reset();
        Ok(())
    }

    /// Runs the whole matrix, calling `start` first unless it already ran.
    /// Resolves with the results on completion; `BenchError::Cancelled` when
    /// cancelled, any other error on a fault.
    pub async fn run<F>(&mut self, mut on_progress: F) -> BenchResult<ResultsStore>
    where
        F: FnMut(&BenchmarkProgress),
    {
        if self.state() != RunState::Running {
            self.start()?;
        }
        let matrix = self.config.matrix();

        log_info!(
            LogComponent::Scheduler("Orchestrator"),
            "starting benchmark: {} backends x {} sizes x {} iterations",
            self.config.backends.len(),
            self.config.sizes.len(),
            self.config.iterations
        );

        let outcome = self.execute(&matrix, &mut on_progress).await;
        let tests_run = self.status.borrow().results.iteration_count();

        let final_state = match &outcome {
            Ok(()) => RunState::Complete,
            Err(BenchError::Cancelled) => RunState::Cancelled,
            Err(_) => RunState::Error,
        };
        {
            let mut status = self.status.borrow_mut();
            status.state.transition(final_state)?;
            if final_state != RunState::Complete {
                status.results.clear();
            }
        }
        self.events.publish(BenchmarkEvent::RunFinished { state: final_state, tests_run });

        match outcome {
            Ok(()) => {
                let results = self.results();
                log_info!(
                    LogComponent::Scheduler("Orchestrator"),
                    "benchmark complete: {}",
                    summarize(&results)
                );
                Ok(results)
            }
            Err(BenchError::Cancelled) => {
                log_info!(
                    LogComponent::Scheduler("Orchestrator"),
                    "benchmark cancelled after {} tests",
                    tests_run
                );
                Err(BenchError::Cancelled)
            }
            Err(err) => {
                log_error!(LogComponent::Scheduler("Orchestrator"), "benchmark failed: {}", err);
                Err(err)
            }
        }
    }

    async fn execute(
        &mut self,
        matrix: &[Configuration],
        on_progress: &mut dyn FnMut(&BenchmarkProgress),
    ) -> BenchResult<()> {
        self.workloads.warm(&self.config.sizes)?;
        let plan = self.scheduler.schedule(matrix, self.config.iterations);
        let total = plan.len();

        for (index, test) in plan.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(BenchError::Cancelled);
            }

            let result = self.run_test(test).await?;
            if result.is_suspect() {
                self.report_suspect(&result);
            }
            self.status.borrow_mut().results.record_iteration(result);

            let progress = BenchmarkProgress::new(
                test.configuration.backend,
                test.configuration.size,
                test.iteration,
                index + 1,
                total,
            );
            log_debug!(LogComponent::Scheduler("Orchestrator"), "{}", progress);
            on_progress(&progress);
            self.events.publish(BenchmarkEvent::TestCompleted(progress));
        }

        self.combine_all(matrix);
        Ok(())
    }

    async fn run_test(&mut self, test: &ScheduledTest) -> BenchResult<IterationResult> {
        let Configuration { backend: id, size } = test.configuration;
        let workload = self.workloads.get_or_generate(size)?;
        let backend = self.backends.get_mut(id)?;

        backend.activate().await?;
        backend.resize()?;
        set_layers(backend, false)?;
        let collected = match backend.load_workload(&workload) {
            Ok(()) => {
                self.clock.sleep(self.config.settle_ms).await;
                let collector = CollectSamplesUseCase::new(&self.config.measurement, &self.cancel);
                collector.execute(&mut self.clock, backend, &workload, &mut self.scratch).await
            }
            Err(err) => Err(err),
        };

        // layers come back even when loading or measuring failed
        let restored = set_layers(backend, true);
        let samples = collected?;
        restored?;
        backend.load_workload(&workload)?;
        self.clock.sleep(self.config.cooldown_ms).await;

        Ok(IterationResult {
            configuration: test.configuration,
            iteration: test.iteration,
            metrics: self.reducer.reduce(&samples.intervals_ms),
            warmup_ticks: samples.warmup_ticks,
            rejected_samples: samples.rejected,
            diagnostics: samples.diagnostics,
        })
    }

    fn report_suspect(&self, result: &IterationResult) {
        let warning = MeasurementWarning {
            configuration: result.configuration,
            iteration: result.iteration,
            throttle_gaps: result.diagnostics.throttle_gaps,
            hidden_ticks: result.diagnostics.hidden_ticks,
            max_gap_ms: result.diagnostics.max_gap_ms,
        };
        log_warn!(LogComponent::Measurement("Diagnostics"), "suspect measurement: {}", warning);
        self.status.borrow_mut().results.record_warning(warning.clone());
        self.events.publish(BenchmarkEvent::MeasurementSuspect(warning));
    }

    fn combine_all(&mut self, matrix: &[Configuration]) {
        let mut status = self.status.borrow_mut();
        for &configuration in matrix {
            let Some(entry) = status.results.get(configuration) else { continue };
            if entry.iterations.len() != self.config.iterations {
                log_error!(
                    LogComponent::Scheduler("Orchestrator"),
                    "{} finished {} of {} iterations, not combining",
                    configuration,
                    entry.iterations.len(),
                    self.config.iterations
                );
                continue;
            }

            let metrics: Vec<_> = entry.iterations.iter().map(|r| r.metrics).collect();
            let mut diagnostics = TimingDiagnostics::default();
            for r in &entry.iterations {
                diagnostics.merge(&r.diagnostics);
            }
            let combined = CombinedResult {
                configuration,
                metrics: self.reducer.combine(&metrics),
                diagnostics,
            };
            if let Ok(json) = serde_json::to_string(&combined.metrics) {
                get_logger().log_with_metadata(
                    LogLevel::Debug,
                    LogComponent::Measurement("Reducer"),
                    &format!("combined {}", configuration),
                    &json,
                );
            }
            status.results.record_combined(combined);
        }
    }
}

/// Shows or hides every layer except points.
fn set_layers(backend: &mut dyn RenderBackend, visible: bool) -> BenchResult<()> {
    for layer in Layer::NON_POINT {
        backend.set_layer_visible(layer, visible)?;
    }
    Ok(())
}
