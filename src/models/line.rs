//! Straight line model, `y = A * x + B`.

use crate::error::Result;
use crate::model::Model;
use crate::models::require;
use crate::parameters::{Parameter, ParameterSet};
use ndarray::Array1;

/// A straight line with slope `A` and intercept `B`
///
/// # Examples
///
/// ```
/// use multifit_rs::model::Model;
/// use multifit_rs::models::LineModel;
/// use ndarray::array;
///
/// let line = LineModel::new(2.0, 1.0);
/// assert_eq!(line.evaluate(&array![0.0, 1.0, 2.0]).unwrap(), array![1.0, 3.0, 5.0]);
/// ```
#[derive(Debug, Clone)]
pub struct LineModel {
    params: ParameterSet,
}

impl LineModel {
    pub fn new(a: f64, b: f64) -> Self {
        let params = ParameterSet::new()
            .with(Parameter::new("A", a))
            .with(Parameter::new("B", b));
        Self { params }
    }
}

impl Default for LineModel {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Model for LineModel {
    fn name(&self) -> &str {
        "LineModel"
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn eval(&self, params: &ParameterSet, x: &Array1<f64>) -> Result<Array1<f64>> {
        let a = require(params, self.name(), "A")?;
        let b = require(params, self.name(), "B")?;
        Ok(x.mapv(|xi| a * xi + b))
    }
}
