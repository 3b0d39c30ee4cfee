//! Binding of a parameter name to a shared model.

use crate::error::{FitError, Result};
use crate::model::{read_model, write_model, ModelRef};
use std::fmt;

/// Couples a parameter name to the get/set accessors of a shared model
///
/// The binding checks that the parameter exists when it is created. It does
/// not enforce the declared range; clamping happens when a fit is assembled.
#[derive(Clone)]
pub struct ParameterBinding {
    model: ModelRef,
    name: String,
}

impl ParameterBinding {
    /// Binds `name` on `model` and writes `initial_value` into it
    ///
    /// Fails with [`FitError::ParameterBinding`] when the model exposes no
    /// such parameter.
    pub fn bind(model: ModelRef, name: &str, initial_value: f64) -> Result<Self> {
        let binding = Self::attach(model, name)?;
        binding.set(initial_value)?;
        Ok(binding)
    }

    /// Binds `name` on `model` without touching its current value
    pub fn attach(model: ModelRef, name: &str) -> Result<Self> {
        {
            let guard = read_model(&model)?;
            if !guard.has_parameter(name) {
                return Err(FitError::ParameterBinding {
                    model: guard.name().to_string(),
                    name: name.to_string(),
                });
            }
        }

        Ok(Self {
            model,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn get(&self) -> Result<f64> {
        read_model(&self.model)?.get_parameter(&self.name)
    }

    pub fn set(&self, value: f64) -> Result<()> {
        write_model(&self.model)?.set_parameter(&self.name, value)
    }
}

impl fmt::Debug for ParameterBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
