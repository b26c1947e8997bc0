//! In-process stand-ins for the browser: a simulated frame clock and a
//! backend that records what it was asked to do. Used for dry runs and tests.

use crate::domain::backend::{BackendId, Layer, RenderBackend};
use crate::domain::clock::FrameClock;
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::workload::{Position, Workload};
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct FrameHook {
    at_frame: usize,
    action: Box<dyn FnMut()>,
}

struct Timeline {
    now_us: Cell<u64>,
    frames: Cell<usize>,
    cursor: Cell<usize>,
    hidden: Cell<bool>,
    pending_work_us: Cell<u64>,
    pattern_us: Vec<u64>,
    hooks: RefCell<Vec<FrameHook>>,
}

/// Deterministic clock. Frame intervals cycle through a fixed pattern;
/// sleeping advances time instantly. Clones share one timeline.
///
/// Time is kept in whole microseconds so constant patterns produce
/// bit-identical intervals.
#[derive(Clone)]
pub struct SimulatedFrameClock {
    timeline: Rc<Timeline>,
}

fn to_us(ms: f64) -> u64 {
    (ms * 1_000.0).round().max(0.0) as u64
}

impl SimulatedFrameClock {
    pub fn constant(interval_ms: f64) -> Self {
        Self::with_intervals(&[interval_ms])
    }

    /// Cycles through `intervals_ms`; an empty pattern means 60 Hz.
    pub fn with_intervals(intervals_ms: &[f64]) -> Self {
        let mut pattern_us: Vec<u64> = intervals_ms.iter().map(|&ms| to_us(ms)).collect();
        if pattern_us.is_empty() {
            pattern_us.push(16_667);
        }
        Self {
            timeline: Rc::new(Timeline {
                now_us: Cell::new(0),
                frames: Cell::new(0),
                cursor: Cell::new(0),
                hidden: Cell::new(false),
                pending_work_us: Cell::new(0),
                pattern_us,
                hooks: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Runs `action` right after frame number `frame` (1-based) is produced.
    pub fn at_frame(&self, frame: usize, action: impl FnMut() + 'static) {
        self.timeline.hooks.borrow_mut().push(FrameHook { at_frame: frame, action: Box::new(action) });
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.timeline.hidden.set(hidden);
    }

    /// Work that must finish before the next frame can be presented.
    /// Frames are dropped until it fits, like a vsync-locked display.
    pub fn add_work(&self, micros: u64) {
        let t = &self.timeline;
        t.pending_work_us.set(t.pending_work_us.get() + micros);
    }

    pub fn frames(&self) -> usize {
        self.timeline.frames.get()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.timeline.now_us.get() as f64 / 1_000.0
    }

    fn advance_frame(&self) -> f64 {
        let t = &self.timeline;
        let cursor = t.cursor.get();
        let base = t.pattern_us[cursor % t.pattern_us.len()];
        let work = t.pending_work_us.replace(0);
        let interval = if base > 0 && work > base { work.div_ceil(base) * base } else { base };

        t.cursor.set(cursor + 1);
        t.now_us.set(t.now_us.get() + interval);
        t.frames.set(t.frames.get() + 1);
        self.run_hooks(t.frames.get());
        self.elapsed_ms()
    }

    fn run_hooks(&self, frame: usize) {
        let due: Vec<FrameHook> = {
            let mut hooks = self.timeline.hooks.borrow_mut();
            let (due, pending): (Vec<_>, Vec<_>) = hooks.drain(..).partition(|h| h.at_frame <= frame);
            *hooks = pending;
            due
        };
        for mut hook in due {
            (hook.action)();
        }
    }
}

impl FrameClock for SimulatedFrameClock {
    fn now(&self) -> f64 {
        self.elapsed_ms()
    }

    fn next_frame(&mut self) -> LocalBoxFuture<'_, BenchResult<f64>> {
        future::ready(Ok(self.advance_frame())).boxed_local()
    }

    fn sleep(&mut self, ms: u32) -> LocalBoxFuture<'_, ()> {
        let t = &self.timeline;
        t.now_us.set(t.now_us.get() + u64::from(ms) * 1_000);
        future::ready(()).boxed_local()
    }

    fn is_hidden(&self) -> bool {
        self.timeline.hidden.get()
    }
}

/// Call where a `HeadlessBackend` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    Activate,
    Load,
    /// Fails the n-th `update_positions` call (1-based).
    Update(usize),
}

/// Everything a `HeadlessBackend` observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendJournal {
    pub activations: usize,
    pub resizes: usize,
    pub loads: usize,
    pub updates: usize,
    pub loaded_len: usize,
    pub hidden_layers: Vec<Layer>,
    /// Updates whose entity count differed from the loaded workload.
    pub mismatched_updates: usize,
}

/// Backend that renders nothing and records every call.
pub struct HeadlessBackend {
    id: BackendId,
    journal: Rc<RefCell<BackendJournal>>,
    fault: Option<FaultPoint>,
    cost: Option<(SimulatedFrameClock, f64)>,
}

impl HeadlessBackend {
    pub fn new(id: BackendId) -> Self {
        Self { id, journal: Rc::new(RefCell::new(BackendJournal::default())), fault: None, cost: None }
    }

    pub fn failing_at(mut self, fault: FaultPoint) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Charges `micros_per_entity` of simulated work to `clock` per update.
    pub fn with_cost(mut self, clock: SimulatedFrameClock, micros_per_entity: f64) -> Self {
        self.cost = Some((clock, micros_per_entity));
        self
    }

    /// Shared view of the journal; stays valid after the backend is boxed.
    pub fn journal(&self) -> Rc<RefCell<BackendJournal>> {
        Rc::clone(&self.journal)
    }

    fn injected(&self, point: FaultPoint) -> BenchResult<()> {
        if self.fault == Some(point) {
            return Err(BenchError::backend(self.id, format!("injected fault at {:?}", point)));
        }
        Ok(())
    }
}

impl RenderBackend for HeadlessBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn activate(&mut self) -> LocalBoxFuture<'_, BenchResult<()>> {
        let outcome = self.injected(FaultPoint::Activate);
        if outcome.is_ok() {
            self.journal.borrow_mut().activations += 1;
        }
        future::ready(outcome).boxed_local()
    }

    fn load_workload(&mut self, workload: &Workload) -> BenchResult<()> {
        self.injected(FaultPoint::Load)?;
        let mut journal = self.journal.borrow_mut();
        journal.loads += 1;
        journal.loaded_len = workload.len();
        Ok(())
    }

    fn update_positions(&mut self, positions: &[Position]) -> BenchResult<()> {
        let call = self.journal.borrow().updates + 1;
        self.injected(FaultPoint::Update(call))?;
        {
            let mut journal = self.journal.borrow_mut();
            journal.updates = call;
            if positions.len() != journal.loaded_len {
                journal.mismatched_updates += 1;
            }
        }
        if let Some((clock, micros_per_entity)) = &self.cost {
            clock.add_work((positions.len() as f64 * micros_per_entity) as u64);
        }
        Ok(())
    }

    fn set_layer_visible(&mut self, layer: Layer, visible: bool) -> BenchResult<()> {
        let mut journal = self.journal.borrow_mut();
        journal.hidden_layers.retain(|l| *l != layer);
        if !visible {
            journal.hidden_layers.push(layer);
        }
        Ok(())
    }

    fn resize(&mut self) -> BenchResult<()> {
        self.journal.borrow_mut().resizes += 1;
        Ok(())
    }
}
