//! Power law with flat background, `y = scale * x^(-exponent) + background`.

use crate::error::{FitError, Result};
use crate::model::Model;
use crate::models::require;
use crate::parameters::{Bounds, Parameter, ParameterSet};
use ndarray::Array1;

/// Power-law decay typical of the high-q tail of a scattering curve
#[derive(Debug, Clone)]
pub struct PowerLawModel {
    params: ParameterSet,
}

impl PowerLawModel {
    /// Create a power law; `exponent` is limited to `[0, 10]` and `scale`
    /// to non-negative values
    pub fn new(scale: f64, exponent: f64, background: f64) -> Self {
        let params = ParameterSet::new()
            .with(Parameter::new("scale", scale).within(Bounds::min_only(0.0)))
            .with(Parameter::new("exponent", exponent).within(Bounds { min: 0.0, max: 10.0 }))
            .with(Parameter::new("background", background));
        Self { params }
    }
}

impl Default for PowerLawModel {
    fn default() -> Self {
        Self::new(1.0, 4.0, 0.0)
    }
}

impl Model for PowerLawModel {
    fn name(&self) -> &str {
        "PowerLawModel"
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn eval(&self, params: &ParameterSet, x: &Array1<f64>) -> Result<Array1<f64>> {
        let scale = require(params, self.name(), "scale")?;
        let exponent = require(params, self.name(), "exponent")?;
        let background = require(params, self.name(), "background")?;

        if x.iter().any(|&xi| xi <= 0.0) {
            return Err(FitError::FunctionEvaluation(
                "PowerLawModel is only defined for x > 0".to_string(),
            ));
        }

        Ok(x.mapv(|xi| scale * xi.powf(-exponent) + background))
    }
}
