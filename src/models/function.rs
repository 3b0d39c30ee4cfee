//! Closure-backed model for user-defined functional forms.

use crate::error::Result;
use crate::model::Model;
use crate::parameters::ParameterSet;
use ndarray::Array1;
use std::fmt;

type EvalFn = dyn Fn(&ParameterSet, &Array1<f64>) -> Result<Array1<f64>> + Send + Sync;

/// A model whose evaluation is supplied as a closure
///
/// # Examples
///
/// ```
/// use multifit_rs::model::Model;
/// use multifit_rs::models::FunctionModel;
/// use multifit_rs::parameters::ParameterSet;
/// use ndarray::array;
///
/// let mut params = ParameterSet::new();
/// params.add_param("k", 3.0).unwrap();
/// let model = FunctionModel::new("scaled", params, |p, x| {
///     let k = p.value("k").unwrap_or(1.0);
///     Ok(x.mapv(|xi| k * xi))
/// });
/// assert_eq!(model.evaluate(&array![1.0, 2.0]).unwrap(), array![3.0, 6.0]);
/// ```
pub struct FunctionModel {
    name: String,
    parameters: ParameterSet,
    eval_func: Box<EvalFn>,
}

impl FunctionModel {
    pub fn new<F>(name: &str, parameters: ParameterSet, eval_func: F) -> Self
    where
        F: Fn(&ParameterSet, &Array1<f64>) -> Result<Array1<f64>> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            parameters,
            eval_func: Box::new(eval_func),
        }
    }
}

impl fmt::Debug for FunctionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionModel")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Model for FunctionModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.parameters
    }

    fn eval(&self, params: &ParameterSet, x: &Array1<f64>) -> Result<Array1<f64>> {
        (self.eval_func)(params, x)
    }
}
