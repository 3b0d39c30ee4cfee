//! Ordered parameter collection owned by a model.

use crate::parameters::expression::{EvaluationContext, ExpressionError};
use crate::parameters::parameter::{Parameter, ParameterError, ParameterStatus};
use serde::{Deserialize, Serialize};

/// An ordered set of uniquely named parameters
///
/// Iteration follows insertion order, which fixes the order in which a model's
/// fitted parameters appear in the optimizer's vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, rejecting duplicate names
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateName {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    /// Chained form of [`ParameterSet::add`] used when a model declares its
    /// parameters; a parameter whose name is already present replaces it in place
    pub fn with(mut self, param: Parameter) -> Self {
        match self.index_of(param.name()) {
            Some(i) => self.params[i] = param,
            None => self.params.push(param),
        }
        self
    }

    /// Add an unbounded parameter
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a parameter with a declared range
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Add a computed parameter, optionally linked through an expression
    pub fn add_computed(
        &mut self,
        name: &str,
        value: f64,
        expr: Option<&str>,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::computed(name, value, expr))
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name() == name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Parameter> {
        self.params.get_mut(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Current value of a parameter, if present
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(Parameter::value)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    /// Parameters with the given status, in order
    pub fn with_status(&self, status: ParameterStatus) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(move |p| p.status() == status)
    }
}

impl EvaluationContext for ParameterSet {
    fn get_variable(&self, name: &str) -> Result<f64, ExpressionError> {
        self.value(name)
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains(name)
    }
}
