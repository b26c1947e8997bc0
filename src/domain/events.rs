use crate::domain::backend::BackendId;
use crate::domain::measurement::{MeasurementWarning, ResultsStore};
use crate::domain::state::RunState;
use serde::Serialize;
use std::fmt;

/// Snapshot sent after each finished test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkProgress {
    pub backend: BackendId,
    pub backend_name: &'static str,
    pub size: usize,
    pub iteration: usize,
    /// 1-based count of finished tests.
    pub test_index: usize,
    pub total_tests: usize,
    pub percent: u8,
}

impl BenchmarkProgress {
    pub fn new(backend: BackendId, size: usize, iteration: usize, test_index: usize, total_tests: usize) -> Self {
        let percent = if total_tests == 0 { 100 } else { (test_index * 100 / total_tests).min(100) as u8 };
        Self {
            backend,
            backend_name: backend.display_name(),
            size,
            iteration,
            test_index,
            total_tests,
            percent,
        }
    }
}

impl fmt::Display for BenchmarkProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} pts, iteration {}, test {}/{} ({}%)",
            self.backend_name,
            self.size,
            self.iteration + 1,
            self.test_index,
            self.total_tests,
            self.percent
        )
    }
}

#[derive(Debug, Clone)]
pub enum BenchmarkEvent {
    TestCompleted(BenchmarkProgress),
    MeasurementSuspect(MeasurementWarning),
    RunFinished { state: RunState, tests_run: usize },
}

impl BenchmarkEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            BenchmarkEvent::TestCompleted(_) => "TestCompleted",
            BenchmarkEvent::MeasurementSuspect(_) => "MeasurementSuspect",
            BenchmarkEvent::RunFinished { .. } => "RunFinished",
        }
    }
}

pub trait EventDispatcher {
    fn publish(&self, event: BenchmarkEvent);
}

/// Fan-out to registered handlers, in subscription order.
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    handlers: Vec<Box<dyn Fn(&BenchmarkEvent)>>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&BenchmarkEvent) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish(&self, event: BenchmarkEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

/// Outcome summary kept alongside the results for UI consumers.
pub fn summarize(store: &ResultsStore) -> String {
    format!(
        "{} configurations, {} iterations, {} warnings",
        store.entries().len(),
        store.iteration_count(),
        store.warnings().len()
    )
}
