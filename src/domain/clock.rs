//! Time sources the measurement loop suspends on, plus cooperative cancellation.

use crate::domain::errors::BenchResult;
use futures::future::LocalBoxFuture;
use std::cell::Cell;
use std::rc::Rc;

/// Display-frame ticks, wall-clock readings and fixed delays.
///
/// Every `await` on this trait is a suspension point of the benchmark.
pub trait FrameClock {
    /// Current wall-clock time in milliseconds.
    fn now(&self) -> f64;

    /// Resolves on the next display frame with the time of the tick.
    fn next_frame(&mut self) -> LocalBoxFuture<'_, BenchResult<f64>>;

    fn sleep(&mut self, ms: u32) -> LocalBoxFuture<'_, ()>;

    /// Whether the page is currently in the background.
    fn is_hidden(&self) -> bool {
        false
    }
}

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }

    pub fn reset(&self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
        observer.reset();
        assert!(!token.is_cancelled());
    }
}
