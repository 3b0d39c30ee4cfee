//! Multi-start search: several simplex refinements from perturbed starting
//! points, keeping the best.

use crate::assembly::Assembly;
use crate::config::FitConfig;
use crate::error::{FitError, Result};
use crate::handler::{FitHandler, HandlerControl};
use crate::optimizer::simplex::{self, SimplexOutcome};
use crate::optimizer::Solution;
use crate::parameters::{Bounds, BoundsTransform};
use crate::problem::Problem;
use crate::uncertainty::UncertaintyCalculator;
use log::{debug, info, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

/// Tracks the last cost reported to the handler
struct Progress {
    last: f64,
    delta: f64,
}

impl Progress {
    /// A non-finite starting cost counts as no report yet
    fn new(initial_cost: f64, delta: f64) -> Self {
        let last = if initial_cost.is_finite() {
            initial_cost
        } else {
            f64::INFINITY
        };
        Self { last, delta }
    }

    /// Relative improvement to report, if `cost` beats the last report by
    /// more than the configured delta
    fn offer(&mut self, cost: f64) -> Option<f64> {
        if !(cost < self.last) {
            return None;
        }
        let relative = if self.last.is_finite() && self.last > 0.0 {
            (self.last - cost) / self.last
        } else {
            1.0
        };
        if relative > self.delta {
            self.last = cost;
            Some(relative)
        } else {
            None
        }
    }
}

/// Driver for the global and local phases of a fit
#[derive(Debug, Clone, Default)]
pub struct MultiStart {
    config: FitConfig,
}

impl MultiStart {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Starting points in external coordinates; the first is `initial`
    pub fn start_points(&self, initial: &Array1<f64>, bounds: &[Bounds]) -> Vec<Array1<f64>> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.start_points_with(initial, bounds, &mut rng)
    }

    pub(crate) fn start_points_with<R: Rng>(
        &self,
        initial: &Array1<f64>,
        bounds: &[Bounds],
        rng: &mut R,
    ) -> Vec<Array1<f64>> {
        let mut points = Vec::with_capacity(self.config.starts);
        points.push(initial.clone());
        for _ in 1..self.config.starts {
            points.push(perturb(initial, bounds, self.config.perturbation, rng));
        }
        points
    }

    /// Minimize the cost of `assembly`, reporting progress to `handler`
    ///
    /// Fails with [`FitError::Convergence`] when the best point is not finite,
    /// or when convergence is required and no start met the tolerance.
    pub fn minimize(&self, assembly: &Assembly, handler: &mut dyn FitHandler) -> Result<Solution> {
        self.config.validate()?;

        let initial = assembly.initial_values();
        let bounds = assembly.bounds();
        let transforms: Vec<BoundsTransform> =
            bounds.iter().copied().map(BoundsTransform::new).collect();

        let initial_cost = assembly.eval_cost(&initial)?;
        info!(
            "fitting {} parameter(s) against {} residual(s), initial cost {:.6e}",
            initial.len(),
            assembly.residual_count(),
            initial_cost
        );

        let mut progress = Progress::new(initial_cost, self.config.improvement_delta);

        let starts = self.start_points(&initial, &bounds);
        let mut best: Option<(Array1<f64>, SimplexOutcome)> = None;
        let mut iterations = 0;
        let mut func_evals = 1;
        let mut starts_run = 0;
        let mut stopped_early = false;
        let mut any_converged = false;

        if self.config.parallel && starts.len() > 1 {
            let outcomes: Vec<Result<SimplexOutcome>> = starts
                .par_iter()
                .map(|start| self.refine(assembly, &transforms, start, |_, _| HandlerControl::Continue))
                .collect();

            for (i, outcome) in outcomes.into_iter().enumerate() {
                let outcome = outcome?;
                starts_run += 1;
                iterations += outcome.iterations;
                func_evals += outcome.func_evals;
                any_converged |= outcome.converged;
                debug!("start {}: cost {:.6e} after {} iterations", i, outcome.cost, outcome.iterations);

                if best.as_ref().map_or(true, |(_, b)| outcome.cost < b.cost) {
                    let external = to_external(&transforms, &outcome.x);
                    let cost = outcome.cost;
                    best = Some((external, outcome));
                    if let Some(delta) = progress.offer(cost) {
                        if let Some((x, _)) = &best {
                            if self.config.incremental_preview {
                                assembly.preview(x)?;
                            }
                        }
                        if handler.on_improvement(cost, delta) == HandlerControl::Stop {
                            stopped_early = true;
                            break;
                        }
                    }
                }
            }
        } else {
            for (i, start) in starts.iter().enumerate() {
                let mut best_cost = best.as_ref().map_or(f64::INFINITY, |(_, b)| b.cost);
                let mut failure: Option<FitError> = None;

                let observer = |cost: f64, x: &Array1<f64>| {
                    if cost >= best_cost {
                        return HandlerControl::Continue;
                    }
                    best_cost = cost;
                    let Some(delta) = progress.offer(cost) else {
                        return HandlerControl::Continue;
                    };
                    if self.config.incremental_preview {
                        if let Err(e) = assembly.preview(&to_external(&transforms, x)) {
                            failure = Some(e);
                            return HandlerControl::Stop;
                        }
                    }
                    handler.on_improvement(cost, delta)
                };

                let outcome = self.refine(assembly, &transforms, start, observer)?;
                if let Some(e) = failure {
                    return Err(e);
                }

                starts_run += 1;
                iterations += outcome.iterations;
                func_evals += outcome.func_evals;
                any_converged |= outcome.converged;
                debug!("start {}: cost {:.6e} after {} iterations", i, outcome.cost, outcome.iterations);

                let stopped = outcome.stopped;
                if best.as_ref().map_or(true, |(_, b)| outcome.cost < b.cost) {
                    best = Some((to_external(&transforms, &outcome.x), outcome));
                }
                if stopped {
                    stopped_early = true;
                    break;
                }
            }
        }

        let (params, outcome) = best.ok_or_else(|| {
            FitError::Convergence("no starting point was refined".to_string())
        })?;

        if !outcome.cost.is_finite() || params.iter().any(|v| !v.is_finite()) {
            return Err(FitError::Convergence(format!(
                "best cost is not finite ({})",
                outcome.cost
            )));
        }
        if self.config.require_convergence && !any_converged && !stopped_early {
            return Err(FitError::Convergence(format!(
                "no start met ftol {:e} within {} iterations",
                self.config.simplex.ftol, self.config.simplex.max_iterations
            )));
        }

        // Re-evaluate in external coordinates so the reported cost matches `params`
        let cost = assembly.eval_cost(&params)?;
        let calculator = UncertaintyCalculator::new(assembly.residual_count(), params.len(), cost);
        let covariance = if params.is_empty() {
            Some(ndarray::Array2::zeros((0, 0)))
        } else {
            match calculator.covariance(assembly, &params, self.config.scale_covariance) {
                Ok(cov) => Some(cov),
                Err(e) => {
                    warn!("covariance unavailable: {}", e);
                    None
                }
            }
        };

        let message = if stopped_early {
            "stopped by handler".to_string()
        } else if outcome.converged {
            format!("converged after {} iterations", iterations)
        } else {
            "maximum iterations reached".to_string()
        };
        info!("fit finished: cost {:.6e}, {}", cost, message);

        Ok(Solution {
            params,
            cost,
            covariance,
            nfree: calculator.nfree,
            redchi: calculator.redchi,
            iterations,
            func_evals,
            starts_run,
            stopped_early,
            converged: outcome.converged,
            message,
        })
    }

    fn refine<O>(
        &self,
        assembly: &Assembly,
        transforms: &[BoundsTransform],
        start: &Array1<f64>,
        observer: O,
    ) -> Result<SimplexOutcome>
    where
        O: FnMut(f64, &Array1<f64>) -> HandlerControl,
    {
        let internal = start
            .iter()
            .zip(transforms)
            .map(|(&v, t)| t.to_internal(v))
            .collect::<std::result::Result<Array1<f64>, _>>()?;

        simplex::minimize(
            |x: &Array1<f64>| assembly.eval_cost(&to_external(transforms, x)),
            &internal,
            &self.config.simplex,
            observer,
        )
    }
}

fn to_external(transforms: &[BoundsTransform], internal: &Array1<f64>) -> Array1<f64> {
    internal
        .iter()
        .zip(transforms)
        .map(|(&v, t)| t.to_external(v))
        .collect()
}

/// Gaussian perturbation of `point`, clamped into `bounds`
fn perturb<R: Rng>(point: &Array1<f64>, bounds: &[Bounds], scale: f64, rng: &mut R) -> Array1<f64> {
    point
        .iter()
        .zip(bounds)
        .map(|(&v, b)| {
            let width = b.width().map_or(0.0, |w| 0.1 * w);
            let sigma = scale * v.abs().max(width).max(1e-3);
            let z: f64 = rng.sample(StandardNormal);
            b.clamp(v + sigma * z)
        })
        .collect()
}
