//! # Covariance Matrix Calculations
//!
//! Covariance, correlation and standard errors from the Jacobian of the
//! residual vector at the optimum.

use crate::error::{FitError, Result};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Singular values below this fraction of the largest are treated as zero.
const SVD_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Calculate the covariance matrix from a Jacobian.
///
/// The covariance is estimated as
///   covar = redchi * pinv(J^T * J)
/// where `pinv` is the SVD pseudo-inverse, so rank-deficient problems (for
/// instance a parameter the residuals do not depend on) still produce a
/// matrix. Pass `redchi = 1.0` for the unscaled estimate.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    if jacobian.iter().any(|v| !v.is_finite()) {
        return Err(FitError::FunctionEvaluation(
            "Jacobian contains non-finite entries".to_string(),
        ));
    }

    let jtj = jacobian.t().dot(jacobian);
    let n = jtj.nrows();
    let matrix = DMatrix::from_fn(n, n, |i, j| jtj[[i, j]]);

    let svd = matrix.svd(true, true);
    let max_singular = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let pinv = svd
        .pseudo_inverse(max_singular * SVD_RELATIVE_TOLERANCE)
        .map_err(|e| FitError::FunctionEvaluation(format!("Pseudo-inverse failed: {}", e)))?;

    Ok(Array2::from_shape_fn((n, n), |(i, j)| pinv[(i, j)] * redchi))
}

/// Calculate correlation matrix from covariance matrix.
///
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                if denom > 0.0 {
                    correl[[i, j]] = covar[[i, j]] / denom;
                }
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Negative or non-finite diagonal entries give a zero uncertainty.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v.is_finite() && v > 0.0 { v.sqrt() } else { 0.0 })
}
