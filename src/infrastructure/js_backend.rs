use crate::domain::backend::{BackendId, Layer, RenderBackend};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::logging::LogComponent;
use crate::domain::workload::{Position, Workload};
use crate::log_debug;
use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Float32Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// JS object driving one map library. Positions arrive as interleaved
    /// `[x0, y0, x1, y1, ...]`; entity `i` owns slots `2i` and `2i + 1`.
    pub type BackendDriver;

    /// May return a Promise that resolves once the view is attached.
    #[wasm_bindgen(method, catch)]
    fn activate(this: &BackendDriver) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadWorkload)]
    fn load_workload(this: &BackendDriver, positions: &Float32Array) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = updatePositions)]
    fn update_positions(this: &BackendDriver, positions: &Float32Array) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setLayerVisible)]
    fn set_layer_visible(this: &BackendDriver, layer: &str, visible: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn resize(this: &BackendDriver) -> Result<(), JsValue>;
}

/// Forwards the backend contract to a JS driver.
///
/// One `Float32Array` sized to the loaded workload is kept and overwritten
/// every tick, so the per-frame path allocates nothing on either side.
pub struct JsBackendAdapter {
    id: BackendId,
    driver: BackendDriver,
    frame_view: Option<Float32Array>,
}

impl JsBackendAdapter {
    pub fn new(id: BackendId, driver: BackendDriver) -> Self {
        Self { id, driver, frame_view: None }
    }

    fn fault(&self, call: &str, err: JsValue) -> BenchError {
        let detail = err.as_string().unwrap_or_else(|| format!("{:?}", err));
        BenchError::backend(self.id, format!("{} threw: {}", call, detail))
    }
}

impl RenderBackend for JsBackendAdapter {
    fn id(&self) -> BackendId {
        self.id
    }

    fn activate(&mut self) -> LocalBoxFuture<'_, BenchResult<()>> {
        async move {
            let returned = self.driver.activate().map_err(|e| self.fault("activate", e))?;
            if let Ok(promise) = returned.dyn_into::<Promise>() {
                JsFuture::from(promise).await.map_err(|e| self.fault("activate", e))?;
            }
            Ok(())
        }
        .boxed_local()
    }

    fn load_workload(&mut self, workload: &Workload) -> BenchResult<()> {
        let positions: Vec<Position> = workload.base_positions().collect();
        let floats: &[f32] = bytemuck::cast_slice(&positions);
        let view = Float32Array::from(floats);
        self.driver.load_workload(&view).map_err(|e| self.fault("loadWorkload", e))?;

        log_debug!(
            LogComponent::Backend("JsAdapter"),
            "{} loaded {} points",
            self.id,
            workload.len()
        );
        self.frame_view = Some(Float32Array::new_with_length(floats.len() as u32));
        Ok(())
    }

    fn update_positions(&mut self, positions: &[Position]) -> BenchResult<()> {
        let floats: &[f32] = bytemuck::cast_slice(positions);
        let view = match &self.frame_view {
            Some(view) if view.length() as usize == floats.len() => view,
            _ => {
                return Err(BenchError::backend(
                    self.id,
                    "updatePositions called with a different entity count than loaded",
                ));
            }
        };
        view.copy_from(floats);
        self.driver.update_positions(view).map_err(|e| self.fault("updatePositions", e))
    }

    fn set_layer_visible(&mut self, layer: Layer, visible: bool) -> BenchResult<()> {
        self.driver
            .set_layer_visible(layer.as_ref(), visible)
            .map_err(|e| self.fault("setLayerVisible", e))
    }

    fn resize(&mut self) -> BenchResult<()> {
        self.driver.resize().map_err(|e| self.fault("resize", e))
    }
}
