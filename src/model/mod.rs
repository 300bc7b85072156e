//! The generative model for the height measurements.
//!
//! Declarative record rather than control flow: parameters are bound to
//! prior distributions, observations to a per-row normal likelihood, and a
//! mode flag selects whether the likelihood conditions on the data or
//! leaves the data slot to be filled by simulation.
//!
//! ```text
//! mu    ~ Normal(196, 0.75)
//! sigma ~ Exponential(1)        (or fixed at 0.5 in the earliest version)
//! h_i   ~ Normal(mu, sigma)     i = 1..n, conditionally independent
//! ```
//!
//! Samplers work on an unconstrained vector `theta`: `theta[0] = mu` and,
//! when sigma is free, `theta[1] = ln(sigma)` with the Jacobian folded into
//! the log posterior.

use crate::dist::{Exponential, Normal};
use crate::error::{EstaturaError, Result};
use rand::Rng;
use rand_distr::StandardNormal;

/// Default prior mean for `mu` (cm).
pub const DEFAULT_MU_MEAN: f64 = 196.0;
/// Default prior standard deviation for `mu` (cm).
pub const DEFAULT_MU_SD: f64 = 0.75;
/// Default prior rate for `sigma`.
pub const DEFAULT_SIGMA_RATE: f64 = 1.0;
/// Fixed sigma used by the earliest model version.
pub const LEGACY_FIXED_SIGMA: f64 = 0.5;

const LN_2PI: f64 = 1.837_877_066_409_345_6;

// Bounds on ln(sigma) keep exp() away from overflow; draws never get near
// them on real data.
const LN_SIGMA_MIN: f64 = -30.0;
const LN_SIGMA_MAX: f64 = 30.0;

/// How the population standard deviation is treated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SigmaSpec {
    /// Known constant (the earliest model version used 0.5).
    Fixed(f64),
    /// Latent, with an exponential prior.
    Exponential(Exponential),
}

/// Whether the likelihood conditions on data or simulates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikelihoodMode {
    /// Condition on the observed heights (posterior inference).
    Observed,
    /// Ignore the likelihood; the data slot is filled by simulation
    /// (prior-predictive runs).
    Predictive,
}

/// The model record consumed by the samplers.
#[derive(Debug, Clone)]
pub struct HeightModel {
    mu_prior: Normal,
    sigma: SigmaSpec,
    observations: Vec<f64>,
    mode: LikelihoodMode,
}

impl HeightModel {
    /// Model over the given observations with the default priors:
    /// `mu ~ Normal(196, 0.75)`, `sigma ~ Exponential(1)`, observed mode.
    ///
    /// # Errors
    ///
    /// Returns an error if `observations` is empty.
    pub fn new(observations: Vec<f64>) -> Result<Self> {
        if observations.is_empty() {
            return Err(EstaturaError::empty_input("model observations"));
        }
        Ok(Self {
            mu_prior: Normal::new(DEFAULT_MU_MEAN, DEFAULT_MU_SD)?,
            sigma: SigmaSpec::Exponential(Exponential::new(DEFAULT_SIGMA_RATE)?),
            observations,
            mode: LikelihoodMode::Observed,
        })
    }

    /// Replace the prior on `mu`.
    #[must_use]
    pub fn with_mu_prior(mut self, prior: Normal) -> Self {
        self.mu_prior = prior;
        self
    }

    /// Replace the prior on `sigma`.
    #[must_use]
    pub fn with_sigma_prior(mut self, prior: Exponential) -> Self {
        self.sigma = SigmaSpec::Exponential(prior);
        self
    }

    /// Fix `sigma` at a known constant.
    ///
    /// # Errors
    ///
    /// Returns an error if `sigma <= 0` or non-finite.
    pub fn with_fixed_sigma(mut self, sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "sigma".to_string(),
                value: format!("{sigma}"),
                constraint: "finite, > 0".to_string(),
            });
        }
        self.sigma = SigmaSpec::Fixed(sigma);
        Ok(self)
    }

    /// Set the likelihood mode.
    #[must_use]
    pub fn with_mode(mut self, mode: LikelihoodMode) -> Self {
        self.mode = mode;
        self
    }

    /// Prior on `mu`.
    #[must_use]
    pub fn mu_prior(&self) -> Normal {
        self.mu_prior
    }

    /// Sigma treatment.
    #[must_use]
    pub fn sigma_spec(&self) -> SigmaSpec {
        self.sigma
    }

    /// Likelihood mode.
    #[must_use]
    pub fn mode(&self) -> LikelihoodMode {
        self.mode
    }

    /// The observed heights.
    #[must_use]
    pub fn observations(&self) -> &[f64] {
        &self.observations
    }

    /// Number of observations the likelihood ranges over.
    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.observations.len()
    }

    /// Dimension of the unconstrained parameter vector.
    #[must_use]
    pub fn dim(&self) -> usize {
        match self.sigma {
            SigmaSpec::Fixed(_) => 1,
            SigmaSpec::Exponential(_) => 2,
        }
    }

    /// Parameter names, in `theta` order.
    #[must_use]
    pub fn param_names(&self) -> Vec<&'static str> {
        match self.sigma {
            SigmaSpec::Fixed(_) => vec!["mu"],
            SigmaSpec::Exponential(_) => vec!["mu", "sigma"],
        }
    }

    /// Map an unconstrained vector to `(mu, sigma)`.
    #[must_use]
    pub fn constrain(&self, theta: &[f64]) -> (f64, f64) {
        let mu = theta[0];
        let sigma = match self.sigma {
            SigmaSpec::Fixed(s) => s,
            SigmaSpec::Exponential(_) => theta[1].clamp(LN_SIGMA_MIN, LN_SIGMA_MAX).exp(),
        };
        (mu, sigma)
    }

    /// Log posterior density at `theta` (up to the likelihood's constant
    /// when the mode is `Predictive`).
    ///
    /// Includes the log-Jacobian of the `sigma = exp(z)` transform so that
    /// samplers can work on the unconstrained scale.
    #[must_use]
    pub fn log_posterior(&self, theta: &[f64]) -> f64 {
        let (mu, sigma) = self.constrain(theta);

        let mut lp = self.mu_prior.ln_pdf(mu);

        if let SigmaSpec::Exponential(prior) = self.sigma {
            let z = theta[1].clamp(LN_SIGMA_MIN, LN_SIGMA_MAX);
            lp += prior.ln_pdf(sigma) + z;
        }

        if self.mode == LikelihoodMode::Observed {
            let n = self.observations.len() as f64;
            let ss: f64 = self
                .observations
                .iter()
                .map(|h| (h - mu).powi(2))
                .sum();
            lp += -n * (sigma.ln() + 0.5 * LN_2PI) - 0.5 * ss / (sigma * sigma);
        }

        lp
    }

    /// Gradient of [`Self::log_posterior`] with respect to `theta`.
    #[must_use]
    pub fn grad_log_posterior(&self, theta: &[f64]) -> Vec<f64> {
        let (mu, sigma) = self.constrain(theta);

        let mut g_mu = -(mu - self.mu_prior.mean()) / (self.mu_prior.sd() * self.mu_prior.sd());
        let mut g_z = match self.sigma {
            SigmaSpec::Fixed(_) => 0.0,
            // d/dz [ln rate - rate * e^z + z] = -rate * e^z + 1
            SigmaSpec::Exponential(prior) => 1.0 - prior.rate() * sigma,
        };

        if self.mode == LikelihoodMode::Observed {
            let n = self.observations.len() as f64;
            let sigma2 = sigma * sigma;
            let resid_sum: f64 = self.observations.iter().map(|h| h - mu).sum();
            let ss: f64 = self
                .observations
                .iter()
                .map(|h| (h - mu).powi(2))
                .sum();

            g_mu += resid_sum / sigma2;
            if matches!(self.sigma, SigmaSpec::Exponential(_)) {
                g_z += -n + ss / sigma2;
            }
        }

        match self.sigma {
            SigmaSpec::Fixed(_) => vec![g_mu],
            SigmaSpec::Exponential(_) => vec![g_mu, g_z],
        }
    }

    /// Draw an initial unconstrained position from the priors.
    pub fn initial_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let mu = self.mu_prior.sample(rng);
        match self.sigma {
            SigmaSpec::Fixed(_) => vec![mu],
            SigmaSpec::Exponential(prior) => {
                let sigma = prior.sample(rng).max(1e-3);
                vec![mu, sigma.ln()]
            }
        }
    }

    /// Fill the data slot: simulate `n` heights from `Normal(mu, sigma)`
    /// at the given parameter values.
    pub fn simulate<R: Rng + ?Sized>(&self, mu: f64, sigma: f64, n: usize, rng: &mut R) -> Vec<f64> {
        (0..n)
            .map(|_| {
                let z: f64 = rng.sample(StandardNormal);
                mu + sigma * z
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
