//! Writing a solution back into the live models.

use crate::assembly::Assembly;
use crate::error::{FitError, Result};
use crate::model::write_model;
use crate::optimizer::Solution;
use crate::parameters::{ParameterBinding, ParameterStatus};
use crate::result::{FitResult, ParameterEstimate};
use crate::uncertainty::{calculate_correlation, standard_errors_from_covariance};
use log::debug;
use ndarray::Array1;

/// Commit `solution` to the models of `assembly` and build the fit result
///
/// Fitted parameters receive their best-fit value, their resolved status and
/// their uncertainty. Unselected parameters only receive the `Fixed` status;
/// computed parameters are not touched. Everything the result reports is
/// evaluated before the first model is written.
pub fn commit(assembly: &Assembly, solution: Solution) -> Result<FitResult> {
    let slots = assembly.slots();
    if solution.params.len() != slots.len() {
        return Err(FitError::Dimension(format!(
            "solution has {} values for {} fitted parameters",
            solution.params.len(),
            slots.len()
        )));
    }

    let uncertainties = match &solution.covariance {
        Some(cov) if cov.nrows() == slots.len() => standard_errors_from_covariance(cov),
        _ => Array1::zeros(slots.len()),
    };
    let correlation = solution.covariance.as_ref().map(calculate_correlation);
    let unit_costs = assembly.unit_costs(&solution.params)?;
    let derived = assembly.derived_values(&solution.params)?;

    for (i, contribution) in assembly.contributions().iter().enumerate() {
        let mut model = write_model(contribution.model())?;
        let model_name = model.name().to_string();
        for resolved in contribution.parameters().iter() {
            if resolved.is_computed() {
                continue;
            }
            let live = model
                .parameters_mut()
                .get_mut(resolved.name())
                .ok_or_else(|| FitError::ParameterBinding {
                    model: model_name.clone(),
                    name: resolved.name().to_string(),
                })?;
            live.set_status(resolved.status())?;
            if resolved.status() == ParameterStatus::Fitted {
                let k = slots
                    .iter()
                    .position(|s| s.entry() == i && s.name() == resolved.name());
                live.set_stderr(k.map(|k| uncertainties[k]));
            }
        }
    }

    for (slot, &value) in slots.iter().zip(solution.params.iter()) {
        let model = assembly.contributions()[slot.entry()].model().clone();
        ParameterBinding::attach(model, slot.name())?.set(value)?;
    }

    let parameters: Vec<ParameterEstimate> = slots
        .iter()
        .zip(solution.params.iter())
        .zip(uncertainties.iter())
        .map(|((slot, &value), &stderr)| ParameterEstimate {
            name: slot.qualified_name().to_string(),
            value,
            stderr,
        })
        .collect();

    debug!("committed {} fitted value(s)", parameters.len());

    Ok(FitResult {
        cost: solution.cost,
        params: solution.params,
        parameters,
        covariance: solution.covariance,
        correlation,
        uncertainties,
        unit_costs,
        derived,
        nfree: solution.nfree,
        redchi: solution.redchi,
        iterations: solution.iterations,
        func_evals: solution.func_evals,
        starts_run: solution.starts_run,
        stopped_early: solution.stopped_early,
        converged: solution.converged,
        message: solution.message,
    })
}
