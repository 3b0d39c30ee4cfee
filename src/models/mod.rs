//! Reference model implementations.
//!
//! The engine treats models as opaque evaluable functions. These variants
//! cover the common cases: a straight line, a power law with background, and
//! a closure-backed model for anything else.

use crate::error::{FitError, Result};
use crate::parameters::ParameterSet;

mod function;
mod line;
mod power_law;

pub use function::FunctionModel;
pub use line::LineModel;
pub use power_law::PowerLawModel;

/// Reads a parameter value from `params`, failing with a binding error.
pub(crate) fn require(params: &ParameterSet, model: &str, name: &str) -> Result<f64> {
    params.value(name).ok_or_else(|| FitError::ParameterBinding {
        model: model.to_string(),
        name: name.to_string(),
    })
}
