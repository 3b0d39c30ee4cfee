//! Nelder-Mead downhill simplex.
//!
//! The simplex works on unbounded coordinates; bounded parameters are mapped
//! through [`BoundsTransform`](crate::parameters::BoundsTransform) by the
//! caller. Non-finite costs are treated as `+inf` so the simplex walks away
//! from them.

use crate::config::SimplexConfig;
use crate::error::Result;
use crate::handler::HandlerControl;
use ndarray::Array1;

/// Reflection, expansion, contraction and shrink coefficients
const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// Initial edge length for coordinates that start at zero.
const ZERO_STEP: f64 = 0.00025;

/// Keeps the relative tolerance meaningful when the cost approaches zero.
const TINY: f64 = 1e-20;

/// Outcome of one simplex refinement
#[derive(Debug, Clone)]
pub struct SimplexOutcome {
    pub x: Array1<f64>,
    pub cost: f64,
    pub iterations: usize,
    pub func_evals: usize,
    pub converged: bool,
    /// The observer asked to stop
    pub stopped: bool,
}

struct Objective<F> {
    f: F,
    evals: usize,
}

impl<F> Objective<F>
where
    F: FnMut(&Array1<f64>) -> Result<f64>,
{
    fn call(&mut self, x: &Array1<f64>) -> Result<f64> {
        self.evals += 1;
        let cost = (self.f)(x)?;
        Ok(if cost.is_nan() { f64::INFINITY } else { cost })
    }
}

fn sort_vertices(vertices: &mut [(Array1<f64>, f64)]) {
    vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
}

/// Minimize `cost` starting from `x0`
///
/// `observer` is called with the best cost and point whenever the best vertex
/// improves; returning [`HandlerControl::Stop`] ends the refinement at the
/// current best vertex.
pub fn minimize<F, O>(
    cost: F,
    x0: &Array1<f64>,
    config: &SimplexConfig,
    mut observer: O,
) -> Result<SimplexOutcome>
where
    F: FnMut(&Array1<f64>) -> Result<f64>,
    O: FnMut(f64, &Array1<f64>) -> HandlerControl,
{
    let n = x0.len();
    let mut objective = Objective { f: cost, evals: 0 };

    let mut vertices: Vec<(Array1<f64>, f64)> = Vec::with_capacity(n + 1);
    let f0 = objective.call(x0)?;
    vertices.push((x0.clone(), f0));
    for i in 0..n {
        let mut x = x0.clone();
        x[i] += if x0[i] != 0.0 {
            config.initial_step * x0[i].abs()
        } else {
            ZERO_STEP
        };
        let fx = objective.call(&x)?;
        vertices.push((x, fx));
    }
    sort_vertices(&mut vertices);

    let mut best = vertices[0].1;
    let mut iterations = 0;
    let mut converged = false;
    let mut stopped = false;

    while iterations < config.max_iterations {
        let fl = vertices[0].1;
        let fh = vertices[n].1;
        // A vertex at +inf has not been measured against the tolerance
        if n == 0
            || (fh.is_finite() && 2.0 * (fh - fl) <= config.ftol * (fh.abs() + fl.abs()) + TINY)
        {
            converged = true;
            break;
        }
        iterations += 1;

        let mut centroid = Array1::zeros(n);
        for (x, _) in &vertices[..n] {
            centroid += x;
        }
        centroid /= n as f64;

        let worst = vertices[n].0.clone();
        let xr = &centroid + &((&centroid - &worst) * ALPHA);
        let fr = objective.call(&xr)?;

        if fr < vertices[0].1 {
            let xe = &centroid + &((&xr - &centroid) * GAMMA);
            let fe = objective.call(&xe)?;
            vertices[n] = if fe < fr { (xe, fe) } else { (xr, fr) };
        } else if fr < vertices[n - 1].1 {
            vertices[n] = (xr, fr);
        } else {
            let (xc, fc, accept) = if fr < fh {
                let xc = &centroid + &((&xr - &centroid) * RHO);
                let fc = objective.call(&xc)?;
                let accept = fc <= fr;
                (xc, fc, accept)
            } else {
                let xc = &centroid + &((&worst - &centroid) * RHO);
                let fc = objective.call(&xc)?;
                let accept = fc < fh;
                (xc, fc, accept)
            };

            if accept {
                vertices[n] = (xc, fc);
            } else {
                let anchor = vertices[0].0.clone();
                for vertex in vertices.iter_mut().skip(1) {
                    let x = &anchor + &((&vertex.0 - &anchor) * SIGMA);
                    let fx = objective.call(&x)?;
                    *vertex = (x, fx);
                }
            }
        }

        sort_vertices(&mut vertices);
        if vertices[0].1 < best {
            best = vertices[0].1;
            if observer(best, &vertices[0].0) == HandlerControl::Stop {
                stopped = true;
                break;
            }
        }
    }

    let (x, cost) = vertices.swap_remove(0);
    Ok(SimplexOutcome {
        x,
        cost,
        iterations,
        func_evals: objective.evals,
        converged,
        stopped,
    })
}
