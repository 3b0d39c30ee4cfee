//! # Parameter System
//!
//! Named model parameters with declared ranges, a closed status tag and
//! optional constraint expressions linking them to other parameters.
//!
//! ## Core Components
//!
//! - [`Parameter`] and [`ParameterStatus`]: a single scalar and its role in a fit
//! - [`ParameterSet`]: the ordered, uniquely named parameters of one model
//! - [`Bounds`] and [`BoundsTransform`]: declared ranges and the bounded search space
//! - [`Expression`]: constraint expressions such as `2 * sphere.radius`
//! - [`ParameterBinding`]: get/set access to a parameter on a shared model
//!
//! ## Example Usage
//!
//! ```rust
//! use multifit_rs::parameters::{ParameterSet, ParameterStatus};
//!
//! let mut params = ParameterSet::new();
//! params.add_param_with_bounds("radius", 20.0, 0.0, 1000.0).unwrap();
//! params.add_computed("diameter", 40.0, Some("2 * radius")).unwrap();
//!
//! assert_eq!(params.get("diameter").unwrap().status(), ParameterStatus::Computed);
//! ```

pub mod binding;
pub mod bounds;
pub mod expression;
pub mod parameter;
pub mod set;

// Re-export key types
pub use binding::ParameterBinding;
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use expression::{EvaluationContext, Expression, ExpressionError};
pub use parameter::{Parameter, ParameterError, ParameterStatus};
pub use set::ParameterSet;
