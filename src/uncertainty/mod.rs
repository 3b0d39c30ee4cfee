//! # Uncertainty Calculation
//!
//! Parameter uncertainties from the curvature of the cost surface at the
//! optimum. The covariance is estimated from a finite-difference Jacobian of
//! the residual vector and optionally scaled by the reduced chi-square.

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};

use crate::error::Result;
use crate::problem::Problem;
use crate::utils::finite_difference;
use ndarray::{Array1, Array2};

/// Calculator for parameter uncertainties.
#[derive(Debug, Clone)]
pub struct UncertaintyCalculator {
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
}

impl UncertaintyCalculator {
    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Self {
        let nfree = ndata.saturating_sub(nvarys);
        let redchi = if nfree > 0 {
            chisqr / nfree as f64
        } else {
            chisqr
        };

        Self {
            nfree,
            chisqr,
            redchi,
        }
    }

    /// Covariance of the fitted parameters of `problem` at `params`
    ///
    /// With `scale` the matrix is multiplied by the reduced chi-square.
    pub fn covariance(
        &self,
        problem: &dyn Problem,
        params: &Array1<f64>,
        scale: bool,
    ) -> Result<Array2<f64>> {
        let jacobian = finite_difference::jacobian(problem, params, None)?;
        let factor = if scale { self.redchi } else { 1.0 };
        calculate_covariance(&jacobian, factor)
    }
}
