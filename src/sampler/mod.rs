//! The inference-engine boundary: draw posterior (or prior) samples from a
//! [`HeightModel`](crate::model::HeightModel).
//!
//! The engine contract is: given a model, chain count, draw and warmup
//! counts, a target acceptance rate and a seed, produce per-chain draws of
//! `(mu, sigma)` tagged by chain and iteration. Chains run in parallel, one
//! task per chain, with no shared mutable state; every chain uses the same
//! model specification and differs only in its seeded random stream.
//!
//! Two Hamiltonian engines are provided, [`Hmc`] with a fixed step size
//! and leapfrog count and the adaptive [`Nuts`], plus [`PriorSampler`]
//! for prior-only runs.

mod hmc;
mod nuts;

pub use hmc::Hmc;
pub use nuts::Nuts;

use crate::error::{EstaturaError, Result};
use crate::model::HeightModel;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Sampling configuration consumed by every engine.
///
/// The defaults are the canonical configuration of the latest report
/// revision: 4 chains, 1000 post-warmup draws, 1000 warmup iterations
/// (discarded), target acceptance 0.8.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    chains: usize,
    draws: usize,
    warmup: usize,
    target_accept: f64,
    seed: u64,
    discard_warmup: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            chains: 4,
            draws: 1000,
            warmup: 1000,
            target_accept: 0.8,
            seed: 42,
            discard_warmup: true,
        }
    }
}

impl SampleConfig {
    /// Canonical configuration (see type docs).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of parallel chains.
    #[must_use]
    pub fn with_chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    /// Set the number of post-warmup draws per chain.
    #[must_use]
    pub fn with_draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    /// Set the number of warmup (adaptation) iterations per chain.
    #[must_use]
    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the adaptation target acceptance rate (NUTS).
    #[must_use]
    pub fn with_target_accept(mut self, target_accept: f64) -> Self {
        self.target_accept = target_accept;
        self
    }

    /// Set the base seed; chain `i` uses `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keep warmup draws in the output instead of discarding them.
    #[must_use]
    pub fn keep_warmup(mut self) -> Self {
        self.discard_warmup = false;
        self
    }

    /// Number of chains.
    #[must_use]
    pub fn chains(&self) -> usize {
        self.chains
    }

    /// Post-warmup draws per chain.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Warmup iterations per chain.
    #[must_use]
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Adaptation target acceptance rate.
    #[must_use]
    pub fn target_accept(&self) -> f64 {
        self.target_accept
    }

    /// Base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether warmup draws are discarded.
    #[must_use]
    pub fn discard_warmup(&self) -> bool {
        self.discard_warmup
    }

    fn validate(&self) -> Result<()> {
        if self.chains == 0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "chains".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        if self.draws == 0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "draws".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.target_accept) || self.target_accept == 0.0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "target_accept".to_string(),
                value: format!("{}", self.target_accept),
                constraint: "in (0, 1)".to_string(),
            });
        }
        Ok(())
    }
}

/// Draws from a single Markov chain, on the constrained `(mu, sigma)`
/// scale.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Chain index (also the offset added to the base seed).
    pub index: usize,
    /// Number of leapfrog trajectories that diverged.
    pub divergences: usize,
    /// Mean Metropolis acceptance probability over retained draws.
    pub accept_rate: f64,
    series: Vec<Vec<f64>>,
}

impl Chain {
    pub(crate) fn with_capacity(index: usize, n_params: usize, capacity: usize) -> Self {
        Self {
            index,
            divergences: 0,
            accept_rate: 1.0,
            series: vec![Vec::with_capacity(capacity); n_params],
        }
    }

    pub(crate) fn push(&mut self, values: &[f64]) {
        for (series, &v) in self.series.iter_mut().zip(values) {
            series.push(v);
        }
    }

    /// Draw sequence for one parameter, in iteration order.
    #[must_use]
    pub fn series(&self, param: usize) -> &[f64] {
        &self.series[param]
    }

    /// Number of retained draws.
    #[must_use]
    pub fn n_draws(&self) -> usize {
        self.series.first().map_or(0, Vec::len)
    }
}

/// The full set of draws across chains.
#[derive(Debug, Clone)]
pub struct PosteriorDraws {
    names: Vec<String>,
    chains: Vec<Chain>,
}

impl PosteriorDraws {
    /// Parameter names, in series order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of a parameter by name.
    #[must_use]
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All chains.
    #[must_use]
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Number of chains.
    #[must_use]
    pub fn n_chains(&self) -> usize {
        self.chains.len()
    }

    /// Retained draws per chain.
    #[must_use]
    pub fn n_draws(&self) -> usize {
        self.chains.first().map_or(0, Chain::n_draws)
    }

    /// Per-chain series for one parameter.
    #[must_use]
    pub fn chain_series(&self, param: usize) -> Vec<&[f64]> {
        self.chains.iter().map(|c| c.series(param)).collect()
    }

    /// All chains concatenated, for one parameter.
    #[must_use]
    pub fn pooled(&self, param: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_chains() * self.n_draws());
        for chain in &self.chains {
            out.extend_from_slice(chain.series(param));
        }
        out
    }

    /// Total divergences across chains.
    #[must_use]
    pub fn divergences(&self) -> usize {
        self.chains.iter().map(|c| c.divergences).sum()
    }
}

/// A sampling engine.
///
/// Implementations draw one chain at a time; the parallel fan-out across
/// chains lives in [`sample`], outside the engines.
pub trait Sampler: Sync {
    /// Engine name, for the report.
    fn name(&self) -> &'static str;

    /// Draw a single chain.
    ///
    /// # Errors
    ///
    /// Propagates any engine failure; the run aborts on the first error.
    fn sample_chain(
        &self,
        model: &HeightModel,
        config: &SampleConfig,
        chain_index: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Chain>;
}

/// Run the engine over all configured chains in parallel.
///
/// One rayon task per chain; chain `i` is seeded with `seed + i` so the
/// chains share the model specification and differ only in their random
/// streams.
///
/// # Errors
///
/// Propagates configuration validation failures and any per-chain engine
/// error.
pub fn sample(
    model: &HeightModel,
    sampler: &dyn Sampler,
    config: &SampleConfig,
) -> Result<PosteriorDraws> {
    config.validate()?;

    let chains: Vec<Chain> = (0..config.chains())
        .into_par_iter()
        .map(|index| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed().wrapping_add(index as u64));
            sampler.sample_chain(model, config, index, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PosteriorDraws {
        names: model.param_names().iter().map(|s| (*s).to_string()).collect(),
        chains,
    })
}

/// Prior-only mode: iid draws from the priors, ignoring the likelihood.
///
/// Used once, for the prior-predictive comparison plot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorSampler;

impl PriorSampler {
    /// Create the prior-only engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Sampler for PriorSampler {
    fn name(&self) -> &'static str {
        "prior"
    }

    fn sample_chain(
        &self,
        model: &HeightModel,
        config: &SampleConfig,
        chain_index: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Chain> {
        let n_params = model.dim();
        let mut chain = Chain::with_capacity(chain_index, n_params, config.draws());

        for _ in 0..config.draws() {
            let theta = model.initial_position(rng);
            let (mu, sigma) = model.constrain(&theta);
            match n_params {
                1 => chain.push(&[mu]),
                _ => chain.push(&[mu, sigma]),
            }
        }

        Ok(chain)
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
