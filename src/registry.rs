//! Keyed, ordered storage of fit units.

use crate::error::{FitError, Result};
use crate::fit_unit::FitUnit;
use crate::model::write_model;
use std::collections::HashMap;

/// Fit units keyed by caller-chosen identifiers
///
/// The registry keeps an explicit insertion-ordered id list next to the map so
/// that the fitted-parameter vector has the same layout every time the same
/// registry state is assembled.
#[derive(Debug, Clone, Default)]
pub struct ProblemRegistry {
    order: Vec<String>,
    units: HashMap<String, FitUnit>,
}

impl ProblemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit, replacing any unit with the same id in place
    pub fn put(&mut self, id: &str, unit: FitUnit) {
        if self.units.insert(id.to_string(), unit).is_none() {
            self.order.push(id.to_string());
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FitUnit> {
        let unit = self.units.remove(id)?;
        self.order.retain(|k| k != id);
        Some(unit)
    }

    pub fn get(&self, id: &str) -> Option<&FitUnit> {
        self.units.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FitUnit> {
        self.units.get_mut(id)
    }

    /// Unit for `id`, creating an empty one at the end of the order if needed
    pub fn unit_mut_or_insert(&mut self, id: &str) -> &mut FitUnit {
        if !self.units.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.units.entry(id.to_string()).or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Write a starting value straight into a unit's model
    ///
    /// No status bookkeeping happens here; the assembly reads the live model
    /// state, so seeding has to happen before the fit is started.
    pub fn seed_parameter(&mut self, id: &str, name: &str, value: f64) -> Result<()> {
        let unit = self
            .units
            .get(id)
            .ok_or_else(|| FitError::UnknownUnit(id.to_string()))?;
        let model = unit.model().ok_or_else(|| FitError::IncompleteUnit {
            id: id.to_string(),
            reason: "no model set".to_string(),
        })?;
        write_model(model)?.set_parameter(name, value)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        self.units
            .get_mut(id)
            .map(|unit| unit.set_enabled(enabled))
            .ok_or_else(|| FitError::UnknownUnit(id.to_string()))
    }

    /// Enabled units in insertion order
    pub fn enabled_units(&self) -> impl Iterator<Item = (&str, &FitUnit)> {
        self.order.iter().filter_map(move |id| {
            self.units
                .get(id)
                .filter(|unit| unit.is_enabled())
                .map(|unit| (id.as_str(), unit))
        })
    }
}
