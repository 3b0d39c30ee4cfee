//! Finite difference Jacobian of a residual vector.

use crate::error::{FitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// `J[i, j] = ∂residual[i] / ∂param[j]`, with the step for each parameter
/// scaled to its magnitude.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();

    let residuals = problem.eval(params)?;
    let n_residuals = residuals.len();
    if n_residuals != problem.residual_count() {
        return Err(FitError::Dimension(format!(
            "Expected {} residuals, got {}",
            problem.residual_count(),
            n_residuals
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let mut params_perturbed = params.clone();

        let param_j = params[j];
        let eps_j = if param_j.abs() > eps {
            param_j.abs() * eps
        } else {
            eps
        };
        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        if residuals_perturbed.len() != n_residuals {
            return Err(FitError::Dimension(format!(
                "Residual count changed from {} to {} during differentiation",
                n_residuals,
                residuals_perturbed.len()
            )));
        }

        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Quadratic;

    impl Problem for Quadratic {
        fn eval(&self, p: &Array1<f64>) -> Result<Array1<f64>> {
            Ok(array![p[0] * p[0], p[0] * p[1], 3.0 * p[1]])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            3
        }
    }

    #[test]
    fn test_jacobian_matches_analytic() {
        let jac = jacobian(&Quadratic, &array![2.0, -0.5], None).unwrap();

        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-4);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-4);
        assert_relative_eq!(jac[[1, 0]], -0.5, epsilon = 1e-4);
        assert_relative_eq!(jac[[1, 1]], 2.0, epsilon = 1e-4);
        assert_relative_eq!(jac[[2, 1]], 3.0, epsilon = 1e-4);
    }
}
