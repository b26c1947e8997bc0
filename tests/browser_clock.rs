#![cfg(target_arch = "wasm32")]

use render_bench_wasm::domain::clock::FrameClock;
use render_bench_wasm::domain::errors::ErrorKind;
use render_bench_wasm::infrastructure::browser_clock::BrowserFrameClock;
use render_bench_wasm::presentation::BenchmarkApi;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test(async)]
async fn frames_advance_monotonically() {
    let mut clock = BrowserFrameClock::new().unwrap();
    let start = clock.now();
    let first = clock.next_frame().await.unwrap();
    let second = clock.next_frame().await.unwrap();
    assert!(first >= start);
    assert!(second > first);
}

#[wasm_bindgen_test(async)]
async fn sleep_waits_at_least_the_delay() {
    let mut clock = BrowserFrameClock::new().unwrap();
    let start = clock.now();
    clock.sleep(30).await;
    assert!(clock.now() - start >= 25.0);
}

#[wasm_bindgen_test]
fn api_starts_idle_with_empty_results() {
    let api = BenchmarkApi::new(Some(r#"{"sizes": [100], "iterations": 1}"#.to_string())).unwrap();
    assert_eq!(api.get_benchmark_state(), "idle");
    assert_eq!(api.get_benchmark_results().unwrap(), r#"{"entries":[],"warnings":[]}"#);
    api.cancel_benchmark();
    assert_eq!(api.get_benchmark_state(), "idle");
}

#[wasm_bindgen_test]
fn bad_config_rejects_with_kind() {
    let err = BenchmarkApi::new(Some(r#"{"iterations": 0}"#.to_string())).err().unwrap();
    let kind = js_sys::Reflect::get(&err, &JsValue::from_str("kind")).unwrap();
    assert_eq!(kind.as_string().as_deref(), Some(ErrorKind::Config.as_ref()));
}

#[wasm_bindgen_test(async)]
async fn run_without_drivers_rejects_as_backend_fault() {
    let api = BenchmarkApi::new(Some(
        r#"{"backends": ["leaflet"], "sizes": [10], "iterations": 1, "settle_ms": 0, "cooldown_ms": 0}"#.to_string(),
    ))
    .unwrap();
    let err = JsFuture::from(api.run_benchmark(None)).await.unwrap_err();
    let kind = js_sys::Reflect::get(&err, &JsValue::from_str("kind")).unwrap();
    assert_eq!(kind.as_string().as_deref(), Some("backend"));
    assert_eq!(api.get_benchmark_state(), "error");
}

#[wasm_bindgen_test(async)]
async fn cancel_in_the_same_tick_stops_the_run() {
    let api = BenchmarkApi::new(Some(r#"{"sizes": [10], "iterations": 1}"#.to_string())).unwrap();
    let promise = api.run_benchmark(None);
    assert_eq!(api.get_benchmark_state(), "running");
    api.cancel_benchmark();

    let err = JsFuture::from(promise).await.unwrap_err();
    let kind = js_sys::Reflect::get(&err, &JsValue::from_str("kind")).unwrap();
    assert_eq!(kind.as_string().as_deref(), Some("cancelled"));
    assert_eq!(api.get_benchmark_state(), "cancelled");
}
