//! Progress notifications during a fit.
//!
//! The optimizer calls [`FitHandler::on_improvement`] whenever the best cost
//! drops by more than the configured relative delta, and the engine calls
//! [`FitHandler::on_complete`] once the result has been committed. Returning
//! [`HandlerControl::Stop`] ends the search early with the best point so far.

use crate::result::FitResult;
use log::info;

/// What the optimizer should do after a progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerControl {
    #[default]
    Continue,
    Stop,
}

/// Receiver of fit progress
///
/// Both methods default to doing nothing.
pub trait FitHandler {
    /// The best cost improved; `delta` is the relative improvement over the
    /// last reported cost
    fn on_improvement(&mut self, cost: f64, delta: f64) -> HandlerControl {
        let _ = (cost, delta);
        HandlerControl::Continue
    }

    /// The fit finished and its result was written back to the models
    fn on_complete(&mut self, result: &FitResult) {
        let _ = result;
    }
}

impl<H: FitHandler + ?Sized> FitHandler for &mut H {
    fn on_improvement(&mut self, cost: f64, delta: f64) -> HandlerControl {
        (**self).on_improvement(cost, delta)
    }

    fn on_complete(&mut self, result: &FitResult) {
        (**self).on_complete(result)
    }
}

impl<H: FitHandler + ?Sized> FitHandler for Box<H> {
    fn on_improvement(&mut self, cost: f64, delta: f64) -> HandlerControl {
        (**self).on_improvement(cost, delta)
    }

    fn on_complete(&mut self, result: &FitResult) {
        (**self).on_complete(result)
    }
}

/// Ignores all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl FitHandler for NoopHandler {}

/// Logs progress at info level
#[derive(Debug, Clone, Default)]
pub struct ConsoleUpdate {
    updates: usize,
}

impl ConsoleUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of improvements logged so far
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl FitHandler for ConsoleUpdate {
    fn on_improvement(&mut self, cost: f64, delta: f64) -> HandlerControl {
        self.updates += 1;
        info!("cost {:.6e} (improved by {:.1}%)", cost, delta * 100.0);
        HandlerControl::Continue
    }

    fn on_complete(&mut self, result: &FitResult) {
        info!(
            "fit complete: cost {:.6e}, {} parameter(s), {} evaluation(s)",
            result.cost,
            result.parameters.len(),
            result.func_evals
        );
    }
}

/// Stops the search after a fixed number of improvements
#[derive(Debug, Clone)]
pub struct CancelAfter {
    remaining: usize,
    seen: usize,
    completed: bool,
}

impl CancelAfter {
    pub fn new(improvements: usize) -> Self {
        Self {
            remaining: improvements,
            seen: 0,
            completed: false,
        }
    }

    /// Improvements received so far
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn completed(&self) -> bool {
        self.completed
    }
}

impl FitHandler for CancelAfter {
    fn on_improvement(&mut self, _cost: f64, _delta: f64) -> HandlerControl {
        self.seen += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            HandlerControl::Stop
        } else {
            HandlerControl::Continue
        }
    }

    fn on_complete(&mut self, _result: &FitResult) {
        self.completed = true;
    }
}
