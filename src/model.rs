//! Model trait and shared model handles.
//!
//! The engine is agnostic to the physical form of a model: all it needs is an
//! ordered set of named parameters and a way to evaluate `y = f(x)` for a
//! given parameter set. Models are shared between the caller, the registry and
//! an in-flight fit through [`ModelRef`] handles.

use crate::error::{FitError, Result};
use crate::parameters::ParameterSet;
use ndarray::Array1;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A trait representing a model that can be fit to data.
pub trait Model {
    /// A short, human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns a reference to the model's parameters.
    fn parameters(&self) -> &ParameterSet;

    /// Returns a mutable reference to the model's parameters.
    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Evaluates the model at `x` using the given parameter values.
    ///
    /// During a fit the engine passes candidate parameter sets here, so an
    /// implementation must read values from `params` and not from
    /// [`Model::parameters`].
    fn eval(&self, params: &ParameterSet, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluates the model at `x` using its current parameter values.
    fn evaluate(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval(self.parameters(), x)
    }

    /// Current value of the named parameter.
    fn get_parameter(&self, name: &str) -> Result<f64> {
        self.parameters()
            .value(name)
            .ok_or_else(|| FitError::ParameterBinding {
                model: self.name().to_string(),
                name: name.to_string(),
            })
    }

    /// Writes the current value of the named parameter.
    ///
    /// The declared range is not enforced.
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let model = self.name().to_string();
        let param = self
            .parameters_mut()
            .get_mut(name)
            .ok_or_else(|| FitError::ParameterBinding {
                model,
                name: name.to_string(),
            })?;
        param.set_value(value);
        Ok(())
    }

    fn has_parameter(&self, name: &str) -> bool {
        self.parameters().contains(name)
    }

    /// Returns the names of all parameters in the model, in order.
    fn parameter_names(&self) -> Vec<String> {
        self.parameters().names()
    }
}

/// Shared handle to a model.
pub type ModelRef = Arc<RwLock<dyn Model + Send + Sync>>;

/// Wraps a model into a shared handle.
pub fn shared<M>(model: M) -> ModelRef
where
    M: Model + Send + Sync + 'static,
{
    Arc::new(RwLock::new(model))
}

/// Acquires a read lock on a shared model.
pub fn read_model(model: &ModelRef) -> Result<RwLockReadGuard<'_, dyn Model + Send + Sync + 'static>> {
    model
        .read()
        .map_err(|_| FitError::InvalidState("model lock poisoned".to_string()))
}

/// Acquires a write lock on a shared model.
pub fn write_model(model: &ModelRef) -> Result<RwLockWriteGuard<'_, dyn Model + Send + Sync + 'static>> {
    model
        .write()
        .map_err(|_| FitError::InvalidState("model lock poisoned".to_string()))
}
