//! Parameter definition and implementation
//!
//! A [`Parameter`] is a named scalar owned by one model. It carries a declared
//! range and a [`ParameterStatus`] that tells the assembly whether the value
//! is free, held constant, or derived from other parameters.

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Parameter '{name}' has a constraint expression and must stay computed")]
    ExpressionAndVary { name: String },

    #[error("Duplicate parameter name '{name}'")]
    DuplicateName { name: String },

    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),
}

/// How a parameter takes part in a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParameterStatus {
    /// Free variable of the optimization
    Fitted,

    /// Held constant for the run
    #[default]
    Fixed,

    /// Derived from other parameters through a fixed relationship
    Computed,
}

impl fmt::Display for ParameterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ParameterStatus::Fitted => "fitted",
            ParameterStatus::Fixed => "fixed",
            ParameterStatus::Computed => "computed",
        };
        f.write_str(tag)
    }
}

/// A named model parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter, unique within its model
    name: String,

    /// Current value of the parameter
    value: f64,

    /// Declared range of the parameter
    #[serde(default)]
    bounds: Bounds,

    /// Role of the parameter in a fit
    #[serde(default)]
    status: ParameterStatus,

    /// Constraint expression of a computed parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expr: Option<String>,

    /// Standard error of the parameter (set after fitting)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stderr: Option<f64>,
}

impl Parameter {
    /// Create a new unbounded, fixed parameter
    ///
    /// # Examples
    ///
    /// ```
    /// use multifit_rs::parameters::{Parameter, ParameterStatus};
    ///
    /// let param = Parameter::new("scale", 10.0);
    /// assert_eq!(param.name(), "scale");
    /// assert_eq!(param.value(), 10.0);
    /// assert_eq!(param.status(), ParameterStatus::Fixed);
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            bounds: Bounds::default(),
            status: ParameterStatus::default(),
            expr: None,
            stderr: None,
        }
    }

    /// Create a new parameter with a declared range
    ///
    /// The value is kept as given even if it lies outside the range; the
    /// assembly clamps selected parameters before a fit starts.
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;

        Ok(Self {
            bounds,
            ..Self::new(name, value)
        })
    }

    /// Builder form of [`Parameter::set_bounds`] for ranges known to be valid
    pub fn within(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Create a computed parameter
    ///
    /// With an expression the value is re-derived on every evaluation during a
    /// fit; without one it is a constant maintained by the model itself.
    pub fn computed(name: &str, value: f64, expr: Option<&str>) -> Self {
        Self {
            status: ParameterStatus::Computed,
            expr: expr.map(str::to_string),
            ..Self::new(name, value)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter
    ///
    /// The range is not enforced here; see [`Parameter::clamp_to_bounds`].
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Set the declared range, leaving the current value as is
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        self.bounds = Bounds::new(min, max)?;
        Ok(())
    }

    pub fn is_within_bounds(&self) -> bool {
        self.bounds.is_within_bounds(self.value)
    }

    /// Move the value to the nearest bound if it lies outside the range
    ///
    /// Returns `true` when the value changed.
    pub fn clamp_to_bounds(&mut self) -> bool {
        let clamped = self.bounds.clamp(self.value);
        let moved = clamped != self.value;
        self.value = clamped;
        moved
    }

    pub fn status(&self) -> ParameterStatus {
        self.status
    }

    pub fn is_computed(&self) -> bool {
        self.status == ParameterStatus::Computed
    }

    /// Change the status of the parameter
    ///
    /// A parameter that carries a constraint expression cannot leave the
    /// `Computed` status; remove the expression first.
    pub fn set_status(&mut self, status: ParameterStatus) -> Result<(), ParameterError> {
        if status != ParameterStatus::Computed && self.expr.is_some() {
            return Err(ParameterError::ExpressionAndVary {
                name: self.name.clone(),
            });
        }

        self.status = status;
        Ok(())
    }

    pub fn expr(&self) -> Option<&str> {
        self.expr.as_deref()
    }

    /// Attach or remove a constraint expression
    ///
    /// Attaching makes the parameter computed; removing one turns a computed
    /// parameter back into a fixed one.
    pub fn set_expr(&mut self, expr: Option<&str>) {
        match expr {
            Some(expr_str) => {
                self.expr = Some(expr_str.to_string());
                self.status = ParameterStatus::Computed;
            }
            None => {
                self.expr = None;
                if self.status == ParameterStatus::Computed {
                    self.status = ParameterStatus::Fixed;
                }
            }
        }
    }

    pub fn stderr(&self) -> Option<f64> {
        self.stderr
    }

    pub fn set_stderr(&mut self, stderr: Option<f64>) {
        self.stderr = stderr;
    }

    /// Create a bounds transform for this parameter
    pub fn bounds_transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }
}
