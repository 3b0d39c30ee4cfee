//! Caller-facing fitting engine.
//!
//! [`FitEngine`] owns a [`ProblemRegistry`] and a [`FitConfig`]. Callers
//! register models and data under string ids, choose which parameters to
//! fit, then call [`FitEngine::fit`]. A fit assembles the enabled units,
//! runs the optimizer and commits the result back to the models; if any step
//! fails the models are left as they were.
//!
//! # Examples
//!
//! ```
//! use multifit_rs::{shared, Dataset, FitEngine, LineModel, NoopHandler};
//! use std::sync::Arc;
//!
//! let data = Dataset::from_slices(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
//!
//! let mut engine = FitEngine::new();
//! engine.set_model("line", shared(LineModel::new(1.0, 0.0))).unwrap();
//! engine.set_data("line", vec![Arc::new(data)]);
//! engine.select_parameters("line", &["A", "B"]).unwrap();
//!
//! let result = engine.fit(&mut NoopHandler).unwrap();
//! assert!((result.value("line.A").unwrap() - 2.0).abs() < 1e-4);
//! assert!((result.value("line.B").unwrap() - 1.0).abs() < 1e-4);
//! ```

use crate::assembly::Assembly;
use crate::config::FitConfig;
use crate::data::Dataset;
use crate::distributor;
use crate::error::{FitError, Result};
use crate::fit_unit::FitUnit;
use crate::handler::{ConsoleUpdate, FitHandler};
use crate::model::ModelRef;
use crate::optimizer::MultiStart;
use crate::registry::ProblemRegistry;
use crate::result::FitResult;
use log::info;
use std::sync::Arc;

/// Fitting engine holding the registered fit units
#[derive(Debug, Clone, Default)]
pub struct FitEngine {
    registry: ProblemRegistry,
    config: FitConfig,
}

impl FitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FitConfig) -> Self {
        Self {
            registry: ProblemRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FitConfig) {
        self.config = config;
    }

    pub fn registry(&self) -> &ProblemRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProblemRegistry {
        &mut self.registry
    }

    /// Set the model of unit `id`, creating the unit if needed
    pub fn set_model(&mut self, id: &str, model: ModelRef) -> Result<()> {
        self.registry.unit_mut_or_insert(id).set_model(model)
    }

    /// Set the datasets of unit `id`, creating the unit if needed
    pub fn set_data(&mut self, id: &str, data: Vec<Arc<Dataset>>) {
        self.registry.unit_mut_or_insert(id).set_data(data);
    }

    /// Register a complete unit under `id`, replacing any previous one in place
    pub fn put(&mut self, id: &str, unit: FitUnit) {
        self.registry.put(id, unit);
    }

    pub fn select_parameters<S: AsRef<str>>(&mut self, id: &str, names: &[S]) -> Result<()> {
        self.registry
            .get_mut(id)
            .ok_or_else(|| FitError::UnknownUnit(id.to_string()))?
            .select_parameters(names)
    }

    /// Write a starting value into a unit's model before fitting
    pub fn seed_parameter(&mut self, id: &str, name: &str, value: f64) -> Result<()> {
        self.registry.seed_parameter(id, name, value)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        self.registry.set_enabled(id, enabled)
    }

    pub fn remove(&mut self, id: &str) -> Option<FitUnit> {
        self.registry.remove(id)
    }

    /// Build the assembly the next fit would run
    pub fn assemble(&self) -> Result<Assembly> {
        Assembly::build(&self.registry)
    }

    /// Fit all enabled units and write the result back to their models
    ///
    /// The handler receives progress notifications while the optimizer runs
    /// and the committed result at the end. Fails with
    /// [`FitError::NothingScheduled`] when no unit is enabled; in that case
    /// the handler is never called.
    pub fn fit(&mut self, handler: &mut dyn FitHandler) -> Result<FitResult> {
        self.config.validate()?;
        let assembly = self.assemble()?;
        info!(
            "starting fit of {} unit(s) with {} start(s)",
            assembly.contributions().len(),
            self.config.starts
        );

        let solution = MultiStart::new(self.config.clone()).minimize(&assembly, handler)?;
        let result = distributor::commit(&assembly, solution)?;
        handler.on_complete(&result);
        Ok(result)
    }

    /// Fit with progress logged through [`ConsoleUpdate`]
    pub fn fit_default(&mut self) -> Result<FitResult> {
        self.fit(&mut ConsoleUpdate::new())
    }
}
