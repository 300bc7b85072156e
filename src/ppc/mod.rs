//! Posterior predictive check: simulate replicate datasets from the
//! fitted posterior and hold them long-form for the overlay plot.
//!
//! A random subsample of posterior draws is taken without replacement;
//! each selected draw simulates one replicate dataset of the observed
//! size. This is a visual diagnostic only: no closeness statistic is
//! computed, and the replicates are discarded after plotting.

use crate::error::{EstaturaError, Result};
use crate::model::{HeightModel, SigmaSpec};
use crate::sampler::PosteriorDraws;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Canonical number of posterior draws used for replicates.
pub const DEFAULT_SUBSAMPLE: usize = 1500;

/// One simulated height, keyed by replicate draw and observation slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Replicate {
    /// Index of the replicate dataset (subsampled draw).
    pub draw: usize,
    /// Observation slot within the replicate, 0..n_obs.
    pub obs: usize,
    /// Simulated height (cm).
    pub height_cm: f64,
}

/// The generated replicate table plus the overlay reference value.
#[derive(Debug, Clone)]
pub struct PredictiveCheck {
    replicates: Vec<Replicate>,
    n_draws_used: usize,
    n_obs: usize,
    mu_mean: f64,
}

impl PredictiveCheck {
    /// Simulate replicate datasets from a posterior sample set.
    ///
    /// Subsamples `min(n_subsample, total draws)` draws without
    /// replacement, then simulates `model.n_obs()` heights from
    /// `Normal(mu, sigma)` for each selected draw.
    ///
    /// # Errors
    ///
    /// Returns an error if the draw set is empty or carries no `mu`
    /// series.
    pub fn generate(
        draws: &PosteriorDraws,
        model: &HeightModel,
        n_subsample: usize,
        seed: u64,
    ) -> Result<Self> {
        let mu_idx = draws
            .param_index("mu")
            .ok_or_else(|| EstaturaError::Other("draws carry no 'mu' series".to_string()))?;
        let mu = draws.pooled(mu_idx);
        if mu.is_empty() {
            return Err(EstaturaError::empty_input("posterior draws"));
        }

        let sigma: Vec<f64> = match draws.param_index("sigma") {
            Some(idx) => draws.pooled(idx),
            None => match model.sigma_spec() {
                SigmaSpec::Fixed(s) => vec![s; mu.len()],
                SigmaSpec::Exponential(_) => {
                    return Err(EstaturaError::Other(
                        "draws carry no 'sigma' series but the model treats sigma as latent"
                            .to_string(),
                    ))
                }
            },
        };

        let total = mu.len();
        let k = n_subsample.min(total);
        let n_obs = model.n_obs();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selected = rand::seq::index::sample(&mut rng, total, k);

        let mut replicates = Vec::with_capacity(k * n_obs);
        for (draw, idx) in selected.iter().enumerate() {
            let simulated = model.simulate(mu[idx], sigma[idx], n_obs, &mut rng);
            for (obs, &height_cm) in simulated.iter().enumerate() {
                replicates.push(Replicate {
                    draw,
                    obs,
                    height_cm,
                });
            }
        }

        let mu_mean = mu.iter().sum::<f64>() / total as f64;

        Ok(Self {
            replicates,
            n_draws_used: k,
            n_obs,
            mu_mean,
        })
    }

    /// The long-form replicate rows.
    #[must_use]
    pub fn replicates(&self) -> &[Replicate] {
        &self.replicates
    }

    /// All simulated heights pooled across replicates.
    #[must_use]
    pub fn pooled_heights(&self) -> Vec<f64> {
        self.replicates.iter().map(|r| r.height_cm).collect()
    }

    /// Number of posterior draws actually used.
    #[must_use]
    pub fn n_draws_used(&self) -> usize {
        self.n_draws_used
    }

    /// Observations per replicate dataset.
    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Posterior mean of `mu` (over all draws, not just the subsample);
    /// the reference line in the overlay plot.
    #[must_use]
    pub fn mu_mean(&self) -> f64 {
        self.mu_mean
    }
}

#[cfg(test)]
#[path = "ppc_tests.rs"]
mod tests;
