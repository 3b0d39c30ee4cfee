//! Configuration options for the fitting engine.
//!
//! [`FitConfig`] controls the multi-start search and the uncertainty
//! estimate; [`SimplexConfig`] controls each local refinement. Both serialize
//! to JSON so that a host can keep fit settings alongside its project files.

use crate::error::{FitError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of the Nelder-Mead local refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplexConfig {
    /// Relative tolerance on the spread of cost values in the simplex. Default: 1e-8
    pub ftol: f64,

    /// Maximum number of simplex iterations per start. Default: 2000
    pub max_iterations: usize,

    /// Size of the initial simplex edges in internal coordinates. Default: 0.1
    pub initial_step: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-8,
            max_iterations: 2000,
            initial_step: 0.1,
        }
    }
}

/// Configuration options for a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Number of starting points of the global search. Default: 1
    pub starts: usize,

    /// Relative cost improvement that triggers a progress notification. Default: 0.1
    pub improvement_delta: f64,

    /// Scale of the Gaussian perturbation for starts after the first. Default: 0.1
    pub perturbation: f64,

    /// Seed for the start point generator; `None` draws from entropy. Default: None
    pub seed: Option<u64>,

    /// Refine starts concurrently on the rayon pool. Default: false
    pub parallel: bool,

    /// Scale the covariance by the reduced chi-square. Default: true
    pub scale_covariance: bool,

    /// Fail when no start meets the simplex tolerance. Default: false
    pub require_convergence: bool,

    /// Write best-so-far values into the live models on each improvement. Default: false
    pub incremental_preview: bool,

    /// Local refinement settings
    pub simplex: SimplexConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            starts: 1,
            improvement_delta: 0.1,
            perturbation: 0.1,
            seed: None,
            parallel: false,
            scale_covariance: true,
            require_convergence: false,
            incremental_preview: false,
            simplex: SimplexConfig::default(),
        }
    }
}

impl FitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_starts(mut self, starts: usize) -> Self {
        self.starts = starts;
        self
    }

    pub fn with_improvement_delta(mut self, delta: f64) -> Self {
        self.improvement_delta = delta;
        self
    }

    pub fn with_perturbation(mut self, perturbation: f64) -> Self {
        self.perturbation = perturbation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_scale_covariance(mut self, scale: bool) -> Self {
        self.scale_covariance = scale;
        self
    }

    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.require_convergence = require;
        self
    }

    pub fn with_incremental_preview(mut self, preview: bool) -> Self {
        self.incremental_preview = preview;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.simplex.ftol = ftol;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.simplex.max_iterations = max_iterations;
        self
    }

    /// Check the settings for values the optimizer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.starts == 0 {
            return Err(FitError::Config("starts must be at least 1".to_string()));
        }
        if !(self.simplex.ftol.is_finite() && self.simplex.ftol > 0.0) {
            return Err(FitError::Config(format!(
                "ftol must be positive, got {}",
                self.simplex.ftol
            )));
        }
        if self.simplex.max_iterations == 0 {
            return Err(FitError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.simplex.initial_step.is_finite() && self.simplex.initial_step > 0.0) {
            return Err(FitError::Config(format!(
                "initial_step must be positive, got {}",
                self.simplex.initial_step
            )));
        }
        if !(self.improvement_delta.is_finite() && self.improvement_delta >= 0.0) {
            return Err(FitError::Config(format!(
                "improvement_delta must be non-negative, got {}",
                self.improvement_delta
            )));
        }
        if !(self.perturbation.is_finite() && self.perturbation >= 0.0) {
            return Err(FitError::Config(format!(
                "perturbation must be non-negative, got {}",
                self.perturbation
            )));
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
