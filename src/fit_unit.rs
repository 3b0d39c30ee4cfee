//! A single (model, datasets, selection) arrangement.

use crate::data::Dataset;
use crate::error::{FitError, Result};
use crate::model::{read_model, ModelRef};
use std::fmt;
use std::sync::Arc;

/// Association of one model with the datasets it is fitted against and the
/// parameters the user selected for fitting
///
/// Units are enabled by default. A disabled unit stays in the registry but is
/// left out of every assembly.
#[derive(Clone)]
pub struct FitUnit {
    model: Option<ModelRef>,
    data: Vec<Arc<Dataset>>,
    selected: Vec<String>,
    enabled: bool,
}

impl Default for FitUnit {
    fn default() -> Self {
        Self {
            model: None,
            data: Vec::new(),
            selected: Vec::new(),
            enabled: true,
        }
    }
}

impl FitUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form used by the tests and examples
    pub fn with_model(model: ModelRef, data: Vec<Arc<Dataset>>) -> Self {
        Self {
            model: Some(model),
            data,
            ..Self::default()
        }
    }

    /// Set the model
    ///
    /// Fails with [`FitError::ParameterBinding`] when the current selection
    /// names a parameter the model does not expose; the unit is unchanged in
    /// that case.
    pub fn set_model(&mut self, model: ModelRef) -> Result<()> {
        {
            let guard = read_model(&model)?;
            if let Some(missing) = self.selected.iter().find(|n| !guard.has_parameter(n)) {
                return Err(FitError::ParameterBinding {
                    model: guard.name().to_string(),
                    name: missing.clone(),
                });
            }
        }
        self.model = Some(model);
        Ok(())
    }

    pub fn set_data(&mut self, data: Vec<Arc<Dataset>>) {
        self.data = data;
    }

    pub fn add_data(&mut self, data: Arc<Dataset>) {
        self.data.push(data);
    }

    /// Replace the selection with `names`, keeping first-seen order
    ///
    /// Fails with [`FitError::ParameterBinding`] when a model is set and does
    /// not expose one of the names; the previous selection is kept in that case.
    pub fn select_parameters<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut selected: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !selected.iter().any(|s| s == name) {
                selected.push(name.to_string());
            }
        }

        if let Some(model) = &self.model {
            let guard = read_model(model)?;
            if let Some(missing) = selected.iter().find(|n| !guard.has_parameter(n)) {
                return Err(FitError::ParameterBinding {
                    model: guard.name().to_string(),
                    name: missing.clone(),
                });
            }
        }

        self.selected = selected;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn model(&self) -> Option<&ModelRef> {
        self.model.as_ref()
    }

    pub fn data(&self) -> &[Arc<Dataset>] {
        &self.data
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }
}

impl fmt::Debug for FitUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitUnit")
            .field("has_model", &self.model.is_some())
            .field("datasets", &self.data.len())
            .field("selected", &self.selected)
            .field("enabled", &self.enabled)
            .finish()
    }
}
