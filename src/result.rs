//! Outcome of a committed fit.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cost of one fit unit at the final vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCost {
    pub id: String,
    /// Sum of squared weighted residuals of this unit
    pub cost: f64,
    pub residual_count: usize,
}

/// Best-fit value of one fitted parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    /// Qualified name, `unit_id.param`
    pub name: String,
    pub value: f64,
    /// One-sigma uncertainty; zero when no covariance was available
    pub stderr: f64,
}

/// Result of a fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    /// Weighted sum of squared residuals at the optimum
    pub cost: f64,

    /// Best-fit vector, in slot order
    pub params: Array1<f64>,

    /// Named view of `params` with uncertainties
    pub parameters: Vec<ParameterEstimate>,

    /// Covariance of the fitted parameters, if it could be computed
    pub covariance: Option<Array2<f64>>,

    /// Correlation matrix derived from the covariance
    pub correlation: Option<Array2<f64>>,

    /// Standard errors in slot order
    pub uncertainties: Array1<f64>,

    /// Per-unit breakdown of `cost`
    pub unit_costs: Vec<UnitCost>,

    /// Values of computed parameters at the optimum, `(unit_id.param, value)`
    pub derived: Vec<(String, f64)>,

    /// Degrees of freedom (residuals minus fitted parameters)
    pub nfree: usize,

    /// Reduced chi-square
    pub redchi: f64,

    /// Simplex iterations summed over all starts
    pub iterations: usize,

    /// Cost evaluations summed over all starts
    pub func_evals: usize,

    /// Number of starts that were refined
    pub starts_run: usize,

    /// Whether the handler ended the search early
    pub stopped_early: bool,

    /// Whether the best start met its tolerance
    pub converged: bool,

    pub message: String,
}

impl FitResult {
    /// Estimate for a qualified parameter name
    pub fn parameter(&self, name: &str) -> Option<&ParameterEstimate> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Best-fit value for a qualified parameter name
    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameter(name).map(|p| p.value)
    }

    /// Derived value of a computed parameter
    pub fn derived_value(&self, name: &str) -> Option<f64> {
        self.derived.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn unit_cost(&self, id: &str) -> Option<&UnitCost> {
        self.unit_costs.iter().find(|u| u.id == id)
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Converged: {}", self.converged)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Reduced chi-square: {:.6e}", self.redchi)?;
        writeln!(f, "  Starts: {}", self.starts_run)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        if self.stopped_early {
            writeln!(f, "  Stopped early by handler")?;
        }
        writeln!(f, "  Message: {}", self.message)?;

        writeln!(f, "\nParameters:")?;
        for p in &self.parameters {
            writeln!(f, "  {:<24} {:>14.6e} +/- {:.3e}", p.name, p.value, p.stderr)?;
        }

        if !self.derived.is_empty() {
            writeln!(f, "\nComputed:")?;
            for (name, value) in &self.derived {
                writeln!(f, "  {:<24} {:>14.6e}", name, value)?;
            }
        }

        if self.unit_costs.len() > 1 {
            writeln!(f, "\nPer unit:")?;
            for unit in &self.unit_costs {
                writeln!(
                    f,
                    "  {:<24} {:>14.6e} ({} points)",
                    unit.id, unit.cost, unit.residual_count
                )?;
            }
        }

        Ok(())
    }
}
