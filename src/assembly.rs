//! Composition of the enabled fit units into one least squares problem.
//!
//! [`Assembly::build`] snapshots the parameter set of every enabled unit's
//! model into a working copy, resolves statuses there and lays out the fitted
//! parameter vector. Live models are only read while building; candidate
//! vectors are evaluated against the working copies.
//!
//! Computed parameters that carry a constraint expression are re-derived on
//! every evaluation. An identifier in an expression is either a parameter of
//! the same model (`radius`) or a parameter of another registered unit
//! (`sphere.radius`).

use crate::data::Dataset;
use crate::error::{FitError, Result};
use crate::model::{read_model, ModelRef};
use crate::parameters::{
    Bounds, EvaluationContext, Expression, ExpressionError, ParameterBinding, ParameterSet,
    ParameterStatus,
};
use crate::problem::Problem;
use crate::registry::ProblemRegistry;
use crate::result::UnitCost;
use log::{debug, warn};
use ndarray::Array1;
use std::collections::HashMap;
use std::sync::Arc;

/// One enabled unit's share of the residual vector
#[derive(Clone)]
pub struct Contribution {
    id: String,
    model: ModelRef,
    data: Vec<Arc<Dataset>>,
    params: ParameterSet,
    residual_count: usize,
}

impl Contribution {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn data(&self) -> &[Arc<Dataset>] {
        &self.data
    }

    /// Working copy of the model's parameters with resolved statuses
    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn residual_count(&self) -> usize {
        self.residual_count
    }

    fn residuals(&self, params: &ParameterSet, out: &mut Vec<f64>) -> Result<()> {
        let model = read_model(&self.model)?;
        for dataset in &self.data {
            let r = dataset.residuals(&*model, params)?;
            out.extend(r.iter());
        }
        Ok(())
    }
}

/// Position of one fitted parameter in the optimizer's vector
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    entry: usize,
    index: usize,
    name: String,
    qualified_name: String,
    bounds: Bounds,
}

impl Slot {
    /// Index of the owning contribution
    pub fn entry(&self) -> usize {
        self.entry
    }

    /// Index of the parameter within its model's set
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `unit_id.param`
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Source {
    Parameter { entry: usize, index: usize },
    Constant(f64),
}

/// A constraint expression with its identifiers resolved
#[derive(Debug, Clone)]
struct Derivation {
    entry: usize,
    index: usize,
    expr: Expression,
    sources: HashMap<String, Source>,
}

struct DerivationContext<'a> {
    sets: &'a [ParameterSet],
    sources: &'a HashMap<String, Source>,
}

impl EvaluationContext for DerivationContext<'_> {
    fn get_variable(&self, name: &str) -> std::result::Result<f64, ExpressionError> {
        let undefined = || ExpressionError::UndefinedVariable {
            name: name.to_string(),
        };
        match self.sources.get(name) {
            Some(Source::Constant(v)) => Ok(*v),
            Some(Source::Parameter { entry, index }) => self
                .sets
                .get(*entry)
                .and_then(|set| set.get_index(*index))
                .map(|p| p.value())
                .ok_or_else(undefined),
            None => Err(undefined()),
        }
    }

    fn has_variable(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }
}

/// The least squares problem assembled from the enabled fit units
#[derive(Clone)]
pub struct Assembly {
    contributions: Vec<Contribution>,
    slots: Vec<Slot>,
    derivations: Vec<Derivation>,
    residual_count: usize,
}

fn same_model(a: &ModelRef, b: &ModelRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl Assembly {
    /// Build the assembly for the enabled units of `registry`
    ///
    /// Fails with [`FitError::NothingScheduled`] when no unit is enabled. Every
    /// other failure (missing model or data, unknown selected names, bad
    /// constraint expressions, dependency cycles) is also reported here,
    /// before any optimizer work.
    pub fn build(registry: &ProblemRegistry) -> Result<Self> {
        let mut contributions: Vec<Contribution> = Vec::new();
        let mut slots = Vec::new();

        for (id, unit) in registry.enabled_units() {
            let model = unit.model().ok_or_else(|| FitError::IncompleteUnit {
                id: id.to_string(),
                reason: "no model set".to_string(),
            })?;
            if unit.data().is_empty() {
                return Err(FitError::IncompleteUnit {
                    id: id.to_string(),
                    reason: "no data set".to_string(),
                });
            }
            if let Some(other) = contributions.iter().find(|c| same_model(&c.model, model)) {
                return Err(FitError::InvalidState(format!(
                    "units '{}' and '{}' share the same model",
                    other.id, id
                )));
            }

            let mut params = {
                let guard = read_model(model)?;
                if let Some(missing) = unit.selected().iter().find(|n| !guard.has_parameter(n)) {
                    return Err(FitError::ParameterBinding {
                        model: guard.name().to_string(),
                        name: missing.clone(),
                    });
                }
                guard.parameters().clone()
            };

            let entry = contributions.len();
            for (index, param) in params.iter_mut().enumerate() {
                if param.is_computed() {
                    if unit.is_selected(param.name()) {
                        debug!("{}.{} is computed and stays out of the fit", id, param.name());
                    }
                    continue;
                }

                if unit.is_selected(param.name()) {
                    param.set_status(ParameterStatus::Fitted)?;
                    let before = param.value();
                    if param.clamp_to_bounds() {
                        warn!(
                            "{}.{} = {} is outside [{}, {}], starting from {}",
                            id,
                            param.name(),
                            before,
                            param.min(),
                            param.max(),
                            param.value()
                        );
                    }
                    slots.push(Slot {
                        entry,
                        index,
                        name: param.name().to_string(),
                        qualified_name: format!("{}.{}", id, param.name()),
                        bounds: *param.bounds(),
                    });
                } else {
                    param.set_status(ParameterStatus::Fixed)?;
                }
            }

            let residual_count: usize = unit.data().iter().map(|d| d.residual_count()).sum();
            if residual_count == 0 {
                return Err(FitError::Dimension(format!(
                    "unit '{}' has no points inside its fit range",
                    id
                )));
            }

            contributions.push(Contribution {
                id: id.to_string(),
                model: model.clone(),
                data: unit.data().to_vec(),
                params,
                residual_count,
            });
        }

        if contributions.is_empty() {
            return Err(FitError::NothingScheduled);
        }

        let derivations = resolve_derivations(registry, &contributions)?;
        let residual_count = contributions.iter().map(|c| c.residual_count).sum();

        debug!(
            "assembled {} unit(s), {} fitted parameter(s), {} residual(s), {} constraint(s)",
            contributions.len(),
            slots.len(),
            residual_count,
            derivations.len()
        );

        Ok(Self {
            contributions,
            slots,
            derivations,
            residual_count,
        })
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Qualified names of the fitted parameters, in vector order
    pub fn slot_names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.qualified_name.clone()).collect()
    }

    /// Starting point: the (clamped) current values of the fitted parameters
    pub fn initial_values(&self) -> Array1<f64> {
        self.slots
            .iter()
            .map(|s| {
                self.contributions[s.entry]
                    .params
                    .get_index(s.index)
                    .map_or(0.0, |p| p.value())
            })
            .collect()
    }

    pub fn bounds(&self) -> Vec<Bounds> {
        self.slots.iter().map(|s| s.bounds).collect()
    }

    fn check_len(&self, vector: &Array1<f64>) -> Result<()> {
        if vector.len() != self.slots.len() {
            return Err(FitError::Dimension(format!(
                "expected {} fitted values, got {}",
                self.slots.len(),
                vector.len()
            )));
        }
        Ok(())
    }

    /// Working parameter sets with `vector` applied and constraints derived
    pub fn candidate_sets(&self, vector: &Array1<f64>) -> Result<Vec<ParameterSet>> {
        self.check_len(vector)?;

        let mut sets: Vec<ParameterSet> =
            self.contributions.iter().map(|c| c.params.clone()).collect();

        for (slot, &value) in self.slots.iter().zip(vector.iter()) {
            if let Some(p) = sets[slot.entry].get_index_mut(slot.index) {
                p.set_value(value);
            }
        }

        for derivation in &self.derivations {
            let value = {
                let ctx = DerivationContext {
                    sets: &sets,
                    sources: &derivation.sources,
                };
                derivation.expr.evaluate(&ctx)?
            };
            if let Some(p) = sets[derivation.entry].get_index_mut(derivation.index) {
                p.set_value(value);
            }
        }

        Ok(sets)
    }

    /// Values of all computed parameters at `vector`, as `(unit_id.param, value)`
    pub fn derived_values(&self, vector: &Array1<f64>) -> Result<Vec<(String, f64)>> {
        let sets = self.candidate_sets(vector)?;
        Ok(self
            .contributions
            .iter()
            .zip(sets.iter())
            .flat_map(|(c, set)| {
                set.with_status(ParameterStatus::Computed)
                    .map(move |p| (format!("{}.{}", c.id, p.name()), p.value()))
            })
            .collect())
    }

    /// Cost of each contribution at `vector`
    pub fn unit_costs(&self, vector: &Array1<f64>) -> Result<Vec<UnitCost>> {
        let sets = self.candidate_sets(vector)?;
        self.contributions
            .iter()
            .zip(sets.iter())
            .map(|(c, set)| {
                let mut residuals = Vec::with_capacity(c.residual_count);
                c.residuals(set, &mut residuals)?;
                Ok(UnitCost {
                    id: c.id.clone(),
                    cost: residuals.iter().map(|r| r * r).sum(),
                    residual_count: residuals.len(),
                })
            })
            .collect()
    }

    /// Write the fitted values of `vector` into the live models
    ///
    /// Only values are touched; statuses and uncertainties are left alone.
    pub fn preview(&self, vector: &Array1<f64>) -> Result<()> {
        self.check_len(vector)?;
        for (slot, &value) in self.slots.iter().zip(vector.iter()) {
            let binding =
                ParameterBinding::attach(self.contributions[slot.entry].model.clone(), &slot.name)?;
            binding.set(value)?;
        }
        Ok(())
    }
}

impl Problem for Assembly {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let sets = self.candidate_sets(params)?;
        let mut residuals = Vec::with_capacity(self.residual_count);
        for (contribution, set) in self.contributions.iter().zip(sets.iter()) {
            contribution.residuals(set, &mut residuals)?;
        }
        Ok(Array1::from(residuals))
    }

    fn parameter_count(&self) -> usize {
        self.slots.len()
    }

    fn residual_count(&self) -> usize {
        self.residual_count
    }
}

/// Resolve every constraint expression and order them so that each one runs
/// after the computed parameters it reads
fn resolve_derivations(
    registry: &ProblemRegistry,
    contributions: &[Contribution],
) -> Result<Vec<Derivation>> {
    let entry_of: HashMap<&str, usize> = contributions
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut pending = Vec::new();
    for (entry, c) in contributions.iter().enumerate() {
        for (index, param) in c.params.iter().enumerate() {
            let Some(text) = param.expr().filter(|_| param.is_computed()) else {
                continue;
            };
            let expr = Expression::parse(text)?;
            let mut sources = HashMap::new();
            for var in expr.variables() {
                let source = resolve_identifier(registry, contributions, &entry_of, entry, &var)?;
                sources.insert(var, source);
            }
            pending.push(Derivation {
                entry,
                index,
                expr,
                sources,
            });
        }
    }

    order_derivations(contributions, pending)
}

fn resolve_identifier(
    registry: &ProblemRegistry,
    contributions: &[Contribution],
    entry_of: &HashMap<&str, usize>,
    entry: usize,
    name: &str,
) -> Result<Source> {
    if let Some(index) = contributions[entry].params.index_of(name) {
        return Ok(Source::Parameter { entry, index });
    }

    let unknown = || {
        FitError::from(ExpressionError::UndefinedVariable {
            name: name.to_string(),
        })
    };
    let (unit_id, param) = name.rsplit_once('.').ok_or_else(unknown)?;

    if let Some(&other) = entry_of.get(unit_id) {
        let index = contributions[other].params.index_of(param).ok_or_else(unknown)?;
        return Ok(Source::Parameter {
            entry: other,
            index,
        });
    }

    // Units outside the fit contribute their current values
    let model = registry
        .get(unit_id)
        .and_then(|u| u.model())
        .ok_or_else(unknown)?;
    let value = read_model(model)?.parameters().value(param).ok_or_else(unknown)?;
    Ok(Source::Constant(value))
}

fn order_derivations(
    contributions: &[Contribution],
    pending: Vec<Derivation>,
) -> Result<Vec<Derivation>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Active,
        Done,
    }

    let node_of: HashMap<(usize, usize), usize> = pending
        .iter()
        .enumerate()
        .map(|(i, d)| ((d.entry, d.index), i))
        .collect();

    fn visit(
        node: usize,
        pending: &[Derivation],
        node_of: &HashMap<(usize, usize), usize>,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
        contributions: &[Contribution],
    ) -> Result<()> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                let d = &pending[node];
                let c = &contributions[d.entry];
                let name = c
                    .params
                    .get_index(d.index)
                    .map_or_else(String::new, |p| format!("{}.{}", c.id, p.name()));
                return Err(ExpressionError::CircularDependency { name }.into());
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::Active;
        let mut deps: Vec<usize> = pending[node]
            .sources
            .values()
            .filter_map(|s| match s {
                Source::Parameter { entry, index } => node_of.get(&(*entry, *index)).copied(),
                Source::Constant(_) => None,
            })
            .collect();
        deps.sort_unstable();
        for dep in deps {
            visit(dep, pending, node_of, marks, order, contributions)?;
        }
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; pending.len()];
    let mut order = Vec::with_capacity(pending.len());
    for node in 0..pending.len() {
        visit(node, &pending, &node_of, &mut marks, &mut order, contributions)?;
    }

    let mut slots: Vec<Option<Derivation>> = pending.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
