use wasm_bindgen::prelude::*;

use crate::domain::logging::LogComponent;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::config::{BenchmarkConfig, MeasurementConfig};
pub use application::use_cases::{BenchmarkHandle, BenchmarkOrchestrator};
pub use domain::backend::{BackendId, Layer, RenderBackend};
pub use domain::errors::{BenchError, BenchResult};
pub use domain::measurement::ResultsStore;
pub use presentation::BenchmarkApi;

/// Installs the panic hook, console logger and browser time source.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console_logger = if cfg!(debug_assertions) {
        infrastructure::services::ConsoleLogger::new_development()
    } else {
        infrastructure::services::ConsoleLogger::new_production()
    };
    domain::logging::init_logger(Box::new(console_logger));
    domain::logging::init_time_provider(Box::new(infrastructure::services::BrowserTimeProvider::new()));

    crate::log_info!(LogComponent::Api("Initialize"), "render benchmark harness ready");
}
