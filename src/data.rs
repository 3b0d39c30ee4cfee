//! Experimental datasets.
//!
//! A [`Dataset`] is immutable once built and shared between fit units as an
//! `Arc<Dataset>`. Residuals are weighted by the `dy` uncertainties when they
//! are present and usable.

use crate::error::{FitError, Result};
use crate::model::Model;
use crate::parameters::ParameterSet;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One measured curve: `y` observed at `x`, with optional uncertainties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    x: Array1<f64>,
    y: Array1<f64>,
    dx: Option<Array1<f64>>,
    dy: Option<Array1<f64>>,
    /// Inclusive `[xmin, xmax]` window of points that take part in a fit
    range: Option<(f64, f64)>,
}

fn check_len(what: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(FitError::Dimension(format!(
            "{} has {} points but x has {}",
            what, len, expected
        )));
    }
    Ok(())
}

impl Dataset {
    /// Create a dataset from matching `x` and `y` arrays
    ///
    /// Fails with [`FitError::Dimension`] when the lengths differ or are zero.
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        if x.is_empty() {
            return Err(FitError::Dimension("dataset has no points".to_string()));
        }
        check_len("y", y.len(), x.len())?;

        Ok(Self {
            x,
            y,
            dx: None,
            dy: None,
            range: None,
        })
    }

    /// Convenience constructor from slices
    pub fn from_slices(x: &[f64], y: &[f64]) -> Result<Self> {
        Self::new(Array1::from(x.to_vec()), Array1::from(y.to_vec()))
    }

    pub fn with_dx(mut self, dx: Array1<f64>) -> Result<Self> {
        check_len("dx", dx.len(), self.x.len())?;
        self.dx = Some(dx);
        Ok(self)
    }

    pub fn with_dy(mut self, dy: Array1<f64>) -> Result<Self> {
        check_len("dy", dy.len(), self.x.len())?;
        self.dy = Some(dy);
        Ok(self)
    }

    /// Restrict the fit to `xmin <= x <= xmax`
    pub fn with_range(mut self, xmin: f64, xmax: f64) -> Result<Self> {
        if xmin.is_nan() || xmax.is_nan() || xmin > xmax {
            return Err(FitError::Dimension(format!(
                "invalid x range [{}, {}]",
                xmin, xmax
            )));
        }
        self.range = Some((xmin, xmax));
        Ok(self)
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn dx(&self) -> Option<&Array1<f64>> {
        self.dx.as_ref()
    }

    pub fn dy(&self) -> Option<&Array1<f64>> {
        self.dy.as_ref()
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn in_range(&self, xi: f64) -> bool {
        match self.range {
            Some((lo, hi)) => xi >= lo && xi <= hi,
            None => true,
        }
    }

    /// Number of points inside the fit range
    pub fn residual_count(&self) -> usize {
        self.x.iter().filter(|&&xi| self.in_range(xi)).count()
    }

    /// Weight applied to the residual at index `i`
    fn sigma(&self, i: usize) -> f64 {
        match &self.dy {
            Some(dy) if dy[i].is_finite() && dy[i] > 0.0 => dy[i],
            _ => 1.0,
        }
    }

    /// Weighted residuals `(y - f(x)) / dy` over the fit range
    pub fn residuals(&self, model: &dyn Model, params: &ParameterSet) -> Result<Array1<f64>> {
        let predicted = model.eval(params, &self.x)?;
        if predicted.len() != self.x.len() {
            return Err(FitError::Dimension(format!(
                "model '{}' returned {} values for {} points",
                model.name(),
                predicted.len(),
                self.x.len()
            )));
        }

        let residuals: Vec<f64> = (0..self.x.len())
            .filter(|&i| self.in_range(self.x[i]))
            .map(|i| (self.y[i] - predicted[i]) / self.sigma(i))
            .collect();

        Ok(Array1::from(residuals))
    }
}
