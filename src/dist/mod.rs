//! The two distribution families the height model quotes.
//!
//! Closed-form densities, CDFs and quantiles are needed for the prior
//! percentile checks and the prior-overlay plot; sampling goes through
//! `rand_distr`'s standard variates so no constructor can fail at draw
//! time.

use crate::error::{EstaturaError, Result};
use rand::Rng;
use rand_distr::{Exp1, StandardNormal};

/// Normal distribution N(mean, sd²).
///
/// **Prior role**: `mu ~ Normal(196, 0.75)`, chosen so the 10th/50th/90th
/// percentiles bracket the plausible range of the author's height.
/// **Likelihood role**: `height_i ~ Normal(mu, sigma)`.
///
/// # Example
///
/// ```
/// use estatura::dist::Normal;
///
/// let prior = Normal::new(196.0, 0.75).unwrap();
/// assert!((prior.quantile(0.5) - 196.0).abs() < 1e-9);
/// assert!((prior.quantile(0.1) - 195.0388).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    sd: f64,
}

impl Normal {
    /// Creates N(mean, sd²).
    ///
    /// # Errors
    ///
    /// Returns an error if `sd <= 0` or either argument is non-finite.
    pub fn new(mean: f64, sd: f64) -> Result<Self> {
        if !mean.is_finite() || !sd.is_finite() || sd <= 0.0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "mean, sd".to_string(),
                value: format!("({mean}, {sd})"),
                constraint: "finite, sd > 0".to_string(),
            });
        }
        Ok(Self { mean, sd })
    }

    /// Distribution mean.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Distribution standard deviation.
    #[must_use]
    pub fn sd(&self) -> f64 {
        self.sd
    }

    /// Probability density at `x`.
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        self.ln_pdf(x).exp()
    }

    /// Log probability density at `x`.
    #[must_use]
    pub fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.sd;
        -0.5 * z * z - self.sd.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
    }

    /// Cumulative distribution function P(X ≤ x).
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / (self.sd * std::f64::consts::SQRT_2);
        0.5 * (1.0 + erf(z))
    }

    /// Quantile (inverse CDF) at probability `p`.
    ///
    /// Uses Acklam's rational approximation for the standard normal
    /// inverse CDF (absolute error below 1.2e-9). Returns ±∞ at p = 0/1
    /// and NaN outside [0, 1].
    #[must_use]
    pub fn quantile(&self, p: f64) -> f64 {
        self.mean + self.sd * std_normal_quantile(p)
    }

    /// Draw one sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.mean + self.sd * z
    }
}

/// Exponential distribution with the given rate.
///
/// **Prior role**: `sigma ~ Exponential(1)` in the model versions that
/// treat the population standard deviation as unknown. Mean = 1/rate,
/// CDF(x) = 1 − e^(−rate·x).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    /// Creates Exponential(rate).
    ///
    /// # Errors
    ///
    /// Returns an error if `rate <= 0` or non-finite.
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EstaturaError::InvalidHyperparameter {
                param: "rate".to_string(),
                value: format!("{rate}"),
                constraint: "finite, > 0".to_string(),
            });
        }
        Ok(Self { rate })
    }

    /// Rate parameter.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Distribution mean, 1/rate.
    #[must_use]
    pub fn mean(&self) -> f64 {
        1.0 / self.rate
    }

    /// Probability density at `x` (zero for negative `x`).
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            self.rate * (-self.rate * x).exp()
        }
    }

    /// Log probability density at `x` (−∞ for negative `x`).
    #[must_use]
    pub fn ln_pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            f64::NEG_INFINITY
        } else {
            self.rate.ln() - self.rate * x
        }
    }

    /// Cumulative distribution function P(X ≤ x).
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            1.0 - (-self.rate * x).exp()
        }
    }

    /// Quantile (inverse CDF) at probability `p`.
    #[must_use]
    pub fn quantile(&self, p: f64) -> f64 {
        -(1.0 - p).ln() / self.rate
    }

    /// Draw one sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let e: f64 = rng.sample(Exp1);
        e / self.rate
    }
}

/// Error function approximation (Abramowitz & Stegun 7.1.26, |ε| < 1.5e-7).
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal inverse CDF (Acklam's rational approximation).
fn std_normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return if p == 0.0 { f64::NEG_INFINITY } else { f64::NAN };
    }
    if p >= 1.0 {
        return if p == 1.0 { f64::INFINITY } else { f64::NAN };
    }

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];

    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

#[cfg(test)]
#[path = "dist_tests.rs"]
mod tests;
