use thiserror::Error;

use crate::parameters::bounds::BoundsError;
use crate::parameters::expression::ExpressionError;
use crate::parameters::parameter::ParameterError;

/// Error types for the multifit-rs library.
#[derive(Error, Debug)]
pub enum FitError {
    /// No enabled fit unit was available when the assembly was built.
    #[error("Nothing scheduled for fitting")]
    NothingScheduled,

    /// A parameter name was not exposed by the model it was looked up on.
    #[error("Model '{model}' has no parameter named '{name}'")]
    ParameterBinding { model: String, name: String },

    /// Dataset sequences of mismatched or zero length.
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// The optimizer did not produce a usable result.
    #[error("Fit did not converge: {0}")]
    Convergence(String),

    /// No fit unit is registered under the given identifier.
    #[error("Unknown fit unit: {0}")]
    UnknownUnit(String),

    /// A fit unit is missing its model or its data.
    #[error("Fit unit '{id}' is incomplete: {reason}")]
    IncompleteUnit { id: String, reason: String },

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Error while parsing, resolving or evaluating a constraint expression.
    #[error("Constraint expression error: {0}")]
    Expression(String),

    /// Error during model evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid state in a shared structure (e.g. a poisoned model lock).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ExpressionError> for FitError {
    fn from(err: ExpressionError) -> Self {
        FitError::Expression(err.to_string())
    }
}

/// Result type alias for multifit-rs operations.
pub type Result<T> = std::result::Result<T, FitError>;
