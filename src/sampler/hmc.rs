//! Fixed-step Hamiltonian Monte Carlo.
//!
//! The earliest engine configuration of this analysis: a fixed step size
//! and a fixed number of leapfrog steps, with a Metropolis accept on the
//! Hamiltonian. No adaptation happens during warmup; warmup draws are
//! plain burn-in.

use super::{Chain, SampleConfig, Sampler};
use crate::error::{EstaturaError, Result};
use crate::model::HeightModel;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// A trajectory whose Hamiltonian drifts by more than this is counted as
/// divergent.
pub(crate) const DIVERGENCE_THRESHOLD: f64 = 1000.0;

/// Hamiltonian sampler with fixed step size and leapfrog count.
#[derive(Debug, Clone, Copy)]
pub struct Hmc {
    step_size: f64,
    n_leapfrog: usize,
}

impl Hmc {
    /// Create the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if `step_size <= 0` or `n_leapfrog == 0`.
    pub fn new(step_size: f64, n_leapfrog: usize) -> Result<Self> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "step_size".to_string(),
                value: format!("{step_size}"),
                constraint: "finite, > 0".to_string(),
            });
        }
        if n_leapfrog == 0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "n_leapfrog".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        Ok(Self {
            step_size,
            n_leapfrog,
        })
    }

    /// Step size.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Leapfrog steps per trajectory.
    #[must_use]
    pub fn n_leapfrog(&self) -> usize {
        self.n_leapfrog
    }
}

impl Sampler for Hmc {
    fn name(&self) -> &'static str {
        "hmc"
    }

    fn sample_chain(
        &self,
        model: &HeightModel,
        config: &SampleConfig,
        chain_index: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Chain> {
        let dim = model.dim();
        let total = config.warmup() + config.draws();
        let mut chain = Chain::with_capacity(chain_index, dim, config.draws());

        let mut theta = model.initial_position(rng);
        let mut accept_sum = 0.0;
        let mut retained = 0usize;

        for iter in 0..total {
            let r0 = draw_momentum(dim, rng);
            let joint0 = joint_ln_density(model, &theta, &r0);

            let mut theta_prop = theta.clone();
            let mut r = r0;
            for _ in 0..self.n_leapfrog {
                leapfrog(model, &mut theta_prop, &mut r, self.step_size);
            }

            let joint1 = joint_ln_density(model, &theta_prop, &r);
            if joint0 - joint1 > DIVERGENCE_THRESHOLD || !joint1.is_finite() {
                chain.divergences += 1;
            }

            let alpha = (joint1 - joint0).exp().min(1.0);
            let alpha = if alpha.is_finite() { alpha } else { 0.0 };
            if rng.gen::<f64>() < alpha {
                theta = theta_prop;
            }

            if iter >= config.warmup() || !config.discard_warmup() {
                let (mu, sigma) = model.constrain(&theta);
                match dim {
                    1 => chain.push(&[mu]),
                    _ => chain.push(&[mu, sigma]),
                }
                accept_sum += alpha;
                retained += 1;
            }
        }

        if retained > 0 {
            chain.accept_rate = accept_sum / retained as f64;
        }
        Ok(chain)
    }
}

/// Draw a standard-normal momentum vector.
pub(crate) fn draw_momentum(dim: usize, rng: &mut ChaCha8Rng) -> Vec<f64> {
    (0..dim).map(|_| rng.sample(StandardNormal)).collect()
}

/// Joint log density of position and momentum (identity mass matrix).
pub(crate) fn joint_ln_density(model: &HeightModel, theta: &[f64], r: &[f64]) -> f64 {
    let kinetic: f64 = r.iter().map(|x| x * x).sum::<f64>() * 0.5;
    model.log_posterior(theta) - kinetic
}

/// One leapfrog step, in place.
pub(crate) fn leapfrog(model: &HeightModel, theta: &mut [f64], r: &mut [f64], step: f64) {
    let grad = model.grad_log_posterior(theta);
    for (ri, gi) in r.iter_mut().zip(&grad) {
        *ri += 0.5 * step * gi;
    }
    for (ti, ri) in theta.iter_mut().zip(r.iter()) {
        *ti += step * ri;
    }
    let grad = model.grad_log_posterior(theta);
    for (ri, gi) in r.iter_mut().zip(&grad) {
        *ri += 0.5 * step * gi;
    }
}
