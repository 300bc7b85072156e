//! No-U-Turn sampler (Hoffman & Gelman 2014, Algorithm 6).
//!
//! Doubling trajectory with the u-turn stopping criterion and a slice
//! variable; the step size is adapted during warmup by dual averaging
//! toward the configured target acceptance rate and then frozen.

use super::hmc::{draw_momentum, joint_ln_density, leapfrog, DIVERGENCE_THRESHOLD};
use super::{Chain, SampleConfig, Sampler};
use crate::error::{EstaturaError, Result};
use crate::model::HeightModel;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

// Dual-averaging constants from the paper.
const DA_GAMMA: f64 = 0.05;
const DA_T0: f64 = 10.0;
const DA_KAPPA: f64 = 0.75;

/// Adaptive No-U-Turn engine.
#[derive(Debug, Clone, Copy)]
pub struct Nuts {
    max_depth: usize,
}

impl Default for Nuts {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

impl Nuts {
    /// Engine with the default maximum tree depth of 10.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum doubling depth.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_depth == 0`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self> {
        if max_depth == 0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "max_depth".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        self.max_depth = max_depth;
        Ok(self)
    }
}

impl Sampler for Nuts {
    fn name(&self) -> &'static str {
        "nuts"
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

        // Dual-averaging state.
        let eps0 = find_reasonable_epsilon(model, &theta, rng);
        let mu_da = (10.0 * eps0).ln();
        let mut eps = eps0;
        let mut ln_eps_bar = 0.0;
        let mut h_bar = 0.0;

        let mut accept_sum = 0.0;
        let mut retained = 0usize;

        for iter in 0..total {
            let r0 = draw_momentum(dim, rng);
            let joint0 = joint_ln_density(model, &theta, &r0);
            let ln_u = joint0 + rng.gen::<f64>().ln();

            let mut theta_minus = theta.clone();
            let mut theta_plus = theta.clone();
            let mut r_minus = r0.clone();
            let mut r_plus = r0;
            let mut theta_new = theta.clone();

            let mut n = 1.0_f64;
            let mut keep_going = true;
            let mut depth = 0usize;
            let mut alpha_stat = 1.0;
            let mut divergent = false;

            while keep_going && depth < self.max_depth {
                let subtree = if rng.gen::<bool>() {
                    let t = build_tree(
                        model, &theta_plus, &r_plus, ln_u, 1.0, depth, eps, joint0, rng,
                    );
                    theta_plus = t.theta_plus.clone();
                    r_plus = t.r_plus.clone();
                    t
                } else {
                    let t = build_tree(
                        model, &theta_minus, &r_minus, ln_u, -1.0, depth, eps, joint0, rng,
                    );
                    theta_minus = t.theta_minus.clone();
                    r_minus = t.r_minus.clone();
                    t
                };

                if subtree.valid && rng.gen::<f64>() < subtree.n / n {
                    theta_new.copy_from_slice(&subtree.theta_prime);
                }
                n += subtree.n;
                divergent |= subtree.divergent;
                alpha_stat = (subtree.alpha / subtree.n_alpha).min(1.0);
                keep_going =
                    subtree.valid && no_u_turn(&theta_minus, &theta_plus, &r_minus, &r_plus);
                depth += 1;
            }

            theta = theta_new;

            if iter < config.warmup() {
                // Dual averaging toward the target acceptance rate.
                let m = (iter + 1) as f64;
                let w = 1.0 / (m + DA_T0);
                h_bar = (1.0 - w) * h_bar + w * (config.target_accept() - alpha_stat);
                let ln_eps = mu_da - m.sqrt() / DA_GAMMA * h_bar;
                let eta = m.powf(-DA_KAPPA);
                ln_eps_bar = eta * ln_eps + (1.0 - eta) * ln_eps_bar;
                eps = ln_eps.exp();
                if iter + 1 == config.warmup() {
                    eps = ln_eps_bar.exp();
                }
            }

            if iter >= config.warmup() || !config.discard_warmup() {
                let (mu, sigma) = model.constrain(&theta);
                match dim {
                    1 => chain.push(&[mu]),
                    _ => chain.push(&[mu, sigma]),
                }
                accept_sum += alpha_stat;
                retained += 1;
                if divergent {
                    chain.divergences += 1;
                }
            }
        }

        if retained > 0 {
            chain.accept_rate = accept_sum / retained as f64;
        }
        Ok(chain)
    }
}

struct Subtree {
    theta_minus: Vec<f64>,
    r_minus: Vec<f64>,
    theta_plus: Vec<f64>,
    r_plus: Vec<f64>,
    theta_prime: Vec<f64>,
    n: f64,
    valid: bool,
    alpha: f64,
    n_alpha: f64,
    divergent: bool,
}

#[allow(clippy::too_many_arguments)]
fn build_tree(
    model: &HeightModel,
    theta: &[f64],
    r: &[f64],
    ln_u: f64,
    direction: f64,
    depth: usize,
    eps: f64,
    joint0: f64,
    rng: &mut ChaCha8Rng,
) -> Subtree {
    if depth == 0 {
        // Base case: one leapfrog step in the chosen direction.
        let mut theta1 = theta.to_vec();
        let mut r1 = r.to_vec();
        leapfrog(model, &mut theta1, &mut r1, direction * eps);

        let joint = joint_ln_density(model, &theta1, &r1);
        let in_slice = ln_u <= joint;
        let divergent = !joint.is_finite() || ln_u - DIVERGENCE_THRESHOLD > joint;
        let alpha = (joint - joint0).exp().min(1.0);

        return Subtree {
            theta_minus: theta1.clone(),
            r_minus: r1.clone(),
            theta_plus: theta1.clone(),
            r_plus: r1,
            theta_prime: theta1,
            n: if in_slice { 1.0 } else { 0.0 },
            valid: !divergent,
            alpha: if alpha.is_finite() { alpha } else { 0.0 },
            n_alpha: 1.0,
            divergent,
        };
    }

    // Recurse: build the inner half, then the outer half.
    let mut inner = build_tree(model, theta, r, ln_u, direction, depth - 1, eps, joint0, rng);
    if !inner.valid {
        return inner;
    }

    let outer = if direction > 0.0 {
        let t = build_tree(
            model,
            &inner.theta_plus,
            &inner.r_plus,
            ln_u,
            direction,
            depth - 1,
            eps,
            joint0,
            rng,
        );
        inner.theta_plus = t.theta_plus.clone();
        inner.r_plus = t.r_plus.clone();
        t
    } else {
        let t = build_tree(
            model,
            &inner.theta_minus,
            &inner.r_minus,
            ln_u,
            direction,
            depth - 1,
            eps,
            joint0,
            rng,
        );
        inner.theta_minus = t.theta_minus.clone();
        inner.r_minus = t.r_minus.clone();
        t
    };

    let n_total = inner.n + outer.n;
    if n_total > 0.0 && rng.gen::<f64>() < outer.n / n_total {
        inner.theta_prime = outer.theta_prime;
    }

    inner.valid = outer.valid
        && no_u_turn(
            &inner.theta_minus,
            &inner.theta_plus,
            &inner.r_minus,
            &inner.r_plus,
        );
    inner.n = n_total;
    inner.alpha += outer.alpha;
    inner.n_alpha += outer.n_alpha;
    inner.divergent |= outer.divergent;
    inner
}

/// The trajectory keeps extending while both ends still move apart.
fn no_u_turn(theta_minus: &[f64], theta_plus: &[f64], r_minus: &[f64], r_plus: &[f64]) -> bool {
    let mut dot_minus = 0.0;
    let mut dot_plus = 0.0;
    for i in 0..theta_minus.len() {
        let span = theta_plus[i] - theta_minus[i];
        dot_minus += span * r_minus[i];
        dot_plus += span * r_plus[i];
    }
    dot_minus >= 0.0 && dot_plus >= 0.0
}

/// Heuristic initial step size (Hoffman & Gelman, Algorithm 4).
fn find_reasonable_epsilon(model: &HeightModel, theta: &[f64], rng: &mut ChaCha8Rng) -> f64 {
    let mut eps = 1.0_f64;
    let r0 = draw_momentum(theta.len(), rng);
    let joint0 = joint_ln_density(model, theta, &r0);

    let log_ratio_at = |eps: f64| -> f64 {
        let mut theta1 = theta.to_vec();
        let mut r1 = r0.clone();
        leapfrog(model, &mut theta1, &mut r1, eps);
        joint_ln_density(model, &theta1, &r1) - joint0
    };

    let mut log_ratio = log_ratio_at(eps);
    let mut guard = 0;
    while !log_ratio.is_finite() && guard < 100 {
        eps *= 0.5;
        log_ratio = log_ratio_at(eps);
        guard += 1;
    }

    let a: f64 = if log_ratio > (0.5_f64).ln() { 1.0 } else { -1.0 };
    let mut guard = 0;
    while a * log_ratio > -a * std::f64::consts::LN_2 && guard < 100 {
        eps *= 2.0_f64.powf(a);
        log_ratio = log_ratio_at(eps);
        guard += 1;
    }
    eps
}
