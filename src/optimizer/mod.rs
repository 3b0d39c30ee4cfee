//! Optimizer driver.
//!
//! A fit runs a global phase of one or more starting points, each refined by
//! a bounded Nelder-Mead simplex ([`simplex`]). The best refinement wins and
//! its covariance is estimated from the Jacobian at the optimum.

pub mod simplex;
mod multistart;

pub use multistart::MultiStart;

use ndarray::{Array1, Array2};
use std::fmt;

/// Best point found by [`MultiStart::minimize`]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Best-fit vector in slot order
    pub params: Array1<f64>,
    /// Cost at `params`
    pub cost: f64,
    /// Covariance of `params`; `None` when it could not be computed
    pub covariance: Option<Array2<f64>>,
    pub nfree: usize,
    pub redchi: f64,
    pub iterations: usize,
    pub func_evals: usize,
    pub starts_run: usize,
    pub stopped_early: bool,
    pub converged: bool,
    pub message: String,
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Converged: {}", self.converged)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Starts: {}", self.starts_run)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}
