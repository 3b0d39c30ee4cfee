//! # multifit-rs
//!
//! `multifit-rs` fits parametric models to one or more scattering curves at
//! once, optionally linking parameters across models with algebraic
//! constraints, and reports best-fit values with uncertainties.
//!
//! The library provides:
//! - A registry of fit units, each pairing a model with its datasets and the
//!   parameters selected for fitting
//! - An assembly step that turns the enabled units into one least squares
//!   problem with a stable parameter layout
//! - A multi-start Nelder-Mead optimizer that respects parameter bounds
//! - Covariance-based uncertainties and a commit step that writes the result
//!   back into the models only once the fit has succeeded
//!
//! ## Basic Usage
//!
//! ```
//! use multifit_rs::{shared, Dataset, FitEngine, LineModel, Model, NoopHandler};
//! use std::sync::Arc;
//!
//! let m1 = shared(LineModel::new(1.0, 0.0));
//! let m2 = shared(LineModel::new(1.0, 0.0));
//! // The second line shares the slope of the first
//! m2.write().unwrap().parameters_mut().get_mut("A").unwrap().set_expr(Some("m1.A"));
//!
//! let d1 = Dataset::from_slices(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
//! let d2 = Dataset::from_slices(&[0.0, 1.0, 2.0, 3.0], &[0.0, 2.0, 4.0, 6.0]).unwrap();
//!
//! let mut engine = FitEngine::new();
//! engine.set_model("m1", m1).unwrap();
//! engine.set_data("m1", vec![Arc::new(d1)]);
//! engine.select_parameters("m1", &["A", "B"]).unwrap();
//! engine.set_model("m2", m2).unwrap();
//! engine.set_data("m2", vec![Arc::new(d2)]);
//! engine.select_parameters("m2", &["B"]).unwrap();
//!
//! let result = engine.fit(&mut NoopHandler).unwrap();
//! assert!((result.value("m1.A").unwrap() - 2.0).abs() < 1e-3);
//! assert!((result.derived_value("m2.A").unwrap() - 2.0).abs() < 1e-3);
//! ```

pub mod assembly;
pub mod config;
pub mod data;
pub mod distributor;
pub mod engine;
pub mod error;
pub mod fit_unit;
pub mod handler;
pub mod model;
pub mod models;
pub mod optimizer;
pub mod parameters;
pub mod problem;
pub mod registry;
pub mod result;
pub mod uncertainty;
pub mod utils;
pub mod worker;

// Re-exports for convenience
pub use assembly::Assembly;
pub use config::{FitConfig, SimplexConfig};
pub use data::Dataset;
pub use engine::FitEngine;
pub use error::{FitError, Result};
pub use fit_unit::FitUnit;
pub use handler::{CancelAfter, ConsoleUpdate, FitHandler, HandlerControl, NoopHandler};
pub use model::{shared, Model, ModelRef};
pub use models::{FunctionModel, LineModel, PowerLawModel};
pub use optimizer::{MultiStart, Solution};
pub use parameters::{Bounds, Parameter, ParameterBinding, ParameterSet, ParameterStatus};
pub use problem::Problem;
pub use registry::ProblemRegistry;
pub use result::{FitResult, ParameterEstimate, UnitCost};
pub use worker::{spawn_fit, FitTask};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
