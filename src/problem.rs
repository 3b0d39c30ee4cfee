//! Problem definition trait.
//!
//! This module defines the `Problem` trait, the least squares view of a fit
//! that the optimizer consumes: a parameter vector in, a residual vector out.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// f(x) = a * x + b against fixed data
    struct LinearProblem {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl Problem for LinearProblem {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            if params.len() != 2 {
                return Err(FitError::Dimension(format!(
                    "Expected 2 parameters, got {}",
                    params.len()
                )));
            }
            let (a, b) = (params[0], params[1]);
            Ok(self
                .x_data
                .iter()
                .zip(self.y_data.iter())
                .map(|(x, y)| a * x + b - y)
                .collect())
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }
    }

    #[test]
    fn test_eval_cost() {
        let problem = LinearProblem {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![2.0, 4.0, 6.0, 8.0, 10.0],
        };

        assert_relative_eq!(problem.eval_cost(&array![2.0, 0.0]).unwrap(), 0.0, epsilon = 1e-10);

        let expected: f64 = (1..=5).map(|i| (i as f64).powi(2)).sum();
        assert_relative_eq!(problem.eval_cost(&array![1.0, 0.0]).unwrap(), expected, epsilon = 1e-10);
        assert!(problem.eval_cost(&array![1.0]).is_err());
    }

    #[test]
    fn test_default_jacobian() {
        let x = array![1.0, 2.0, 3.0];
        let problem = LinearProblem {
            x_data: x.clone(),
            y_data: array![0.0, 0.0, 0.0],
        };

        let jac = problem.jacobian(&array![2.0, 1.0]).unwrap();
        assert_eq!(jac.shape(), &[3, 2]);
        for i in 0..3 {
            assert_relative_eq!(jac[[i, 0]], x[i], epsilon = 1e-5);
            assert_relative_eq!(jac[[i, 1]], 1.0, epsilon = 1e-5);
        }
    }
}
