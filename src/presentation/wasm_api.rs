use crate::application::config::BenchmarkConfig;
use crate::application::use_cases::{BenchmarkHandle, BenchmarkOrchestrator};
use crate::domain::backend::BackendId;
use crate::domain::errors::{BenchError, ErrorKind};
use crate::domain::logging::LogComponent;
use crate::infrastructure::browser_clock::BrowserFrameClock;
use crate::infrastructure::js_backend::{BackendDriver, JsBackendAdapter};
use crate::{log_info, log_warn};
use js_sys::{Function, Promise};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

type Slot = Rc<RefCell<Option<BenchmarkOrchestrator<BrowserFrameClock>>>>;

/// Shape of every rejection handed to JS.
#[derive(Serialize)]
struct JsErrorPayload<'a> {
    kind: ErrorKind,
    message: &'a str,
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

/// `{ kind, message }`, falling back to a bare string.
pub fn bench_error_to_js(err: &BenchError) -> JsValue {
    let message = err.to_string();
    to_js_value(&JsErrorPayload { kind: err.kind(), message: &message })
        .unwrap_or_else(|_| JsValue::from_str(&message))
}

/// JS entry point: owns the orchestrator between runs and lends it to the
/// promise while one is in flight.
#[wasm_bindgen]
pub struct BenchmarkApi {
    orchestrator: Slot,
    handle: BenchmarkHandle,
}

#[wasm_bindgen]
impl BenchmarkApi {
    /// `config_json` may be a partial `BenchmarkConfig`; omitted fields keep defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BenchmarkApi, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) => BenchmarkConfig::from_json(json),
            None => Ok(BenchmarkConfig::default()),
        }
        .map_err(|e| bench_error_to_js(&e))?;

        let clock = BrowserFrameClock::new().map_err(|e| bench_error_to_js(&e))?;
        let shuffle_seed = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;
        let orchestrator =
            BenchmarkOrchestrator::new(config, clock, shuffle_seed).map_err(|e| bench_error_to_js(&e))?;
        let handle = orchestrator.handle();

        log_info!(
            LogComponent::Api("BenchmarkApi"),
            "created with {} tests per run",
            orchestrator.config().total_tests()
        );
        Ok(Self { orchestrator: Rc::new(RefCell::new(Some(orchestrator))), handle })
    }

    /// Binds a JS driver to a backend key such as `"leaflet"` or `"deckgl"`.
    #[wasm_bindgen(js_name = registerBackend)]
    pub fn register_backend(&self, id: &str, driver: BackendDriver) -> Result<(), JsValue> {
        let backend = BackendId::from_str(id).map_err(|_| {
            bench_error_to_js(&BenchError::InvalidConfig(format!("unknown backend key '{}'", id)))
        })?;
        let mut slot = self.orchestrator.borrow_mut();
        let orchestrator = slot.as_mut().ok_or_else(|| bench_error_to_js(&BenchError::AlreadyRunning))?;
        orchestrator.register_backend(Box::new(JsBackendAdapter::new(backend, driver)));
        Ok(())
    }

    /// Resolves with the results JSON. `on_progress` receives one object
    /// per finished test.
    #[wasm_bindgen(js_name = runBenchmark)]
    pub fn run_benchmark(&self, on_progress: Option<Function>) -> Promise {
        let slot = Rc::clone(&self.orchestrator);
        let Some(mut orchestrator) = slot.borrow_mut().take() else {
            return Promise::reject(&bench_error_to_js(&BenchError::AlreadyRunning));
        };
        // running before the promise is first polled, so a same-tick cancel lands
        if let Err(err) = orchestrator.start() {
            *slot.borrow_mut() = Some(orchestrator);
            return Promise::reject(&bench_error_to_js(&err));
        }

        future_to_promise(async move {

            let outcome = orchestrator
                .run(|progress| {
                    let Some(callback) = &on_progress else { return };
                    let delivered = to_js_value(progress).and_then(|v| callback.call1(&JsValue::NULL, &v));
                    if let Err(err) = delivered {
                        log_warn!(LogComponent::Api("BenchmarkApi"), "progress callback failed: {:?}", err);
                    }
                })
                .await;
            *slot.borrow_mut() = Some(orchestrator);

            let results = outcome.map_err(|e| bench_error_to_js(&e))?;
            let json = results
                .to_json()
                .map_err(|e| bench_error_to_js(&BenchError::Serialization(e.to_string())))?;
            Ok(JsValue::from_str(&json))
        })
    }

    /// No-op unless a run is active.
    #[wasm_bindgen(js_name = cancelBenchmark)]
    pub fn cancel_benchmark(&self) {
        self.handle.cancel();
    }

    #[wasm_bindgen(js_name = getBenchmarkResults)]
    pub fn get_benchmark_results(&self) -> Result<String, JsValue> {
        self.handle.results().to_json().map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `"idle" | "running" | "complete" | "cancelled" | "error"`.
    #[wasm_bindgen(js_name = getBenchmarkState)]
    pub fn get_benchmark_state(&self) -> String {
        self.handle.state().to_string()
    }

    /// One `{ backend, label, points: [[size, fps], ...] }` entry per backend.
    #[wasm_bindgen(js_name = getChartSeries)]
    pub fn get_chart_series(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.handle.results().chart_series()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Clears results and scratch buffers. Rejected while a run is active.
    #[wasm_bindgen(js_name = resetBenchmark)]
    pub fn reset_benchmark(&self) -> Result<(), JsValue> {
        let mut slot = self.orchestrator.borrow_mut();
        let orchestrator = slot.as_mut().ok_or_else(|| bench_error_to_js(&BenchError::AlreadyRunning))?;
        orchestrator.reset().map_err(|e| bench_error_to_js(&e))
    }
}
