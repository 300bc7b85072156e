//! Convergence diagnostics for the posterior draws.
//!
//! Split R-hat, autocorrelation-based effective sample size and
//! per-parameter summaries. Pure reporting: nothing here gates the rest of
//! the pipeline; the narrative interprets the numbers.
//!
//! Reference: Gelman et al. (2013), "Bayesian Data Analysis", Ch. 11.

use crate::error::{EstaturaError, Result};
use crate::sampler::PosteriorDraws;
use std::fmt;

/// Summary statistics for one model parameter.
#[derive(Debug, Clone)]
pub struct ParameterSummary {
    /// Parameter name.
    pub name: String,
    /// Posterior mean.
    pub mean: f64,
    /// Posterior standard deviation.
    pub sd: f64,
    /// 5% quantile.
    pub q5: f64,
    /// Median.
    pub median: f64,
    /// 95% quantile.
    pub q95: f64,
    /// Effective sample size across chains.
    pub ess: f64,
    /// Split R-hat across chains.
    pub rhat: f64,
}

impl fmt::Display for ParameterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:>9.3} {:>7.3} {:>9.3} {:>9.3} {:>9.3} {:>8.0} {:>6.3}",
            self.name, self.mean, self.sd, self.q5, self.median, self.q95, self.ess, self.rhat
        )
    }
}

/// Render the summary table with its header row.
#[must_use]
pub fn render_table(summaries: &[ParameterSummary]) -> String {
    let mut out = format!(
        "{:<8} {:>9} {:>7} {:>9} {:>9} {:>9} {:>8} {:>6}\n",
        "param", "mean", "sd", "5%", "50%", "95%", "ess", "rhat"
    );
    for summary in summaries {
        out.push_str(&summary.to_string());
        out.push('\n');
    }
    out
}

/// Summarize every parameter of a posterior sample set.
///
/// # Errors
///
/// Returns an error if the draw set has no chains or empty chains.
pub fn summarize(draws: &PosteriorDraws) -> Result<Vec<ParameterSummary>> {
    if draws.n_chains() == 0 || draws.n_draws() == 0 {
        return Err(EstaturaError::empty_input("posterior draws"));
    }

    draws
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let chains = draws.chain_series(idx);
            let pooled = draws.pooled(idx);

            let n = pooled.len() as f64;
            let mean = pooled.iter().sum::<f64>() / n;
            let sd = if pooled.len() > 1 {
                (pooled.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            } else {
                0.0
            };

            Ok(ParameterSummary {
                name: name.clone(),
                mean,
                sd,
                q5: quantile(&pooled, 0.05)?,
                median: quantile(&pooled, 0.5)?,
                q95: quantile(&pooled, 0.95)?,
                ess: effective_sample_size(&chains),
                rhat: split_rhat(&chains),
            })
        })
        .collect()
}

/// Quantile with linear interpolation (R-7, Hyndman & Fan 1996).
///
/// # Errors
///
/// Returns an error if `values` is empty or `q` is outside [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(EstaturaError::empty_input("quantile input"));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(EstaturaError::InvalidHyperparameter {
            param: "q".to_string(),
            value: format!("{q}"),
            constraint: "in [0, 1]".to_string(),
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return Ok(sorted[0]);
    }

    let h = q * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Autocorrelation of a draw sequence at the given lag.
#[must_use]
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if lag >= n {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance: f64 = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if variance < 1e-15 {
        return 0.0;
    }

    let covariance: f64 = values[..n - lag]
        .iter()
        .zip(values[lag..].iter())
        .map(|(x, y)| (x - mean) * (y - mean))
        .sum::<f64>()
        / n as f64;

    covariance / variance
}

/// Effective sample size of a single chain.
///
/// ESS = n / (1 + 2 Σ ρ_k), with the autocorrelation sum truncated at the
/// first negligible lag.
#[must_use]
pub fn ess_chain(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return n as f64;
    }

    let max_lag = (n / 2).min(100);
    let mut sum_rho = 0.0;

    for lag in 1..max_lag {
        let rho = autocorrelation(values, lag);
        if rho.abs() < 0.05 {
            break;
        }
        sum_rho += rho;
    }

    let tau = 1.0 + 2.0 * sum_rho;
    if tau > 0.0 {
        (n as f64 / tau).min(n as f64)
    } else {
        n as f64
    }
}

/// Effective sample size across chains (sum of per-chain estimates).
#[must_use]
pub fn effective_sample_size(chains: &[&[f64]]) -> f64 {
    chains.iter().map(|c| ess_chain(c)).sum()
}

/// Split R-hat: each chain is halved, then the between/within variance
/// ratio is computed over the half-chains. Values near 1 indicate that
/// the chains agree.
#[must_use]
pub fn split_rhat(chains: &[&[f64]]) -> f64 {
    let mut halves: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        let n = chain.len();
        if n < 4 {
            return f64::NAN;
        }
        let mid = n / 2;
        halves.push(&chain[..mid]);
        // Skip the middle element of odd-length chains so halves match.
        halves.push(&chain[n - mid..]);
    }

    let m = halves.len() as f64;
    let n = halves[0].len() as f64;

    let means: Vec<f64> = halves
        .iter()
        .map(|h| h.iter().sum::<f64>() / n)
        .collect();
    let variances: Vec<f64> = halves
        .iter()
        .zip(&means)
        .map(|(h, &mean)| h.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0))
        .collect();

    let grand_mean = means.iter().sum::<f64>() / m;
    let b = n / (m - 1.0) * means.iter().map(|x| (x - grand_mean).powi(2)).sum::<f64>();
    let w = variances.iter().sum::<f64>() / m;

    if w < 1e-300 {
        return if b < 1e-300 { 1.0 } else { f64::INFINITY };
    }

    let var_plus = (n - 1.0) / n * w + b / n;
    (var_plus / w).sqrt()
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
