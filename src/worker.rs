//! Running a fit off the caller's thread.
//!
//! The engine stays behind a mutex for the whole "assemble, optimize,
//! commit" sequence, so a second fit on the same engine waits for the first.
//! Handler callbacks run on the worker thread.

use crate::engine::FitEngine;
use crate::error::{FitError, Result};
use crate::handler::FitHandler;
use crate::result::FitResult;
use log::debug;
use std::sync::{Arc, Mutex};
use std::thread;

/// Handle to a fit running on its own thread
#[derive(Debug)]
pub struct FitTask {
    handle: thread::JoinHandle<Result<FitResult>>,
}

impl FitTask {
    /// Whether the fit has finished; `join` will not block once this is true
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the fit and take its result
    pub fn join(self) -> Result<FitResult> {
        self.handle
            .join()
            .map_err(|_| FitError::InvalidState("fit worker panicked".to_string()))?
    }
}

/// Start a fit of `engine` on a new thread
pub fn spawn_fit<H>(engine: Arc<Mutex<FitEngine>>, mut handler: H) -> FitTask
where
    H: FitHandler + Send + 'static,
{
    let handle = thread::spawn(move || {
        let mut engine = engine
            .lock()
            .map_err(|_| FitError::InvalidState("engine lock poisoned".to_string()))?;
        debug!("fit worker acquired the engine");
        engine.fit(&mut handler)
    });

    FitTask { handle }
}
