use crate::domain::clock::FrameClock;
use crate::domain::errors::{BenchError, BenchResult};
use futures::future::{FutureExt, LocalBoxFuture};
use gloo_timers::future::sleep;
use js_sys::Promise;
use std::time::Duration;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Performance, Window};

/// Frame clock backed by `requestAnimationFrame` and `performance.now()`.
pub struct BrowserFrameClock {
    window: Window,
    performance: Performance,
}

impl BrowserFrameClock {
    pub fn new() -> BenchResult<Self> {
        let window = web_sys::window().ok_or_else(|| BenchError::Clock("window not available".into()))?;
        let performance = window
            .performance()
            .ok_or_else(|| BenchError::Clock("performance API not available".into()))?;
        Ok(Self { window, performance })
    }

    fn request_frame(&self) -> BenchResult<Promise> {
        let mut scheduled = Ok(0);
        let promise = Promise::new(&mut |resolve, _reject| {
            scheduled = self.window.request_animation_frame(&resolve);
        });
        scheduled.map_err(|e| BenchError::Clock(format!("requestAnimationFrame failed: {:?}", e)))?;
        Ok(promise)
    }
}

impl FrameClock for BrowserFrameClock {
    fn now(&self) -> f64 {
        self.performance.now()
    }

    /// The tick time is read after the callback fires so it is comparable
    /// with `now()`; the rAF timestamp itself is the frame start time.
    fn next_frame(&mut self) -> LocalBoxFuture<'_, BenchResult<f64>> {
        async move {
            let promise = self.request_frame()?;
            JsFuture::from(promise)
                .await
                .map_err(|e| BenchError::Clock(format!("frame callback rejected: {:?}", e)))?;
            Ok(self.performance.now())
        }
        .boxed_local()
    }

    fn sleep(&mut self, ms: u32) -> LocalBoxFuture<'_, ()> {
        sleep(Duration::from_millis(u64::from(ms))).boxed_local()
    }

    fn is_hidden(&self) -> bool {
        self.window.document().map(|d| d.hidden()).unwrap_or(false)
    }
}
