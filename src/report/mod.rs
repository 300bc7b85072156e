//! The narrative report: prose interleaved with the run's own numbers.
//!
//! Rendered as Markdown next to the plots, so the document always embeds
//! the posterior summaries of the run that produced it.

use crate::dataset::{HeightDataset, HeightSummary};
use crate::diagnostics::{render_table, ParameterSummary};
use crate::error::{EstaturaError, Result};
use crate::model::{HeightModel, SigmaSpec};
use crate::sampler::{PosteriorDraws, SampleConfig};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Everything the report needs from the run.
#[derive(Debug)]
pub struct Report<'a> {
    dataset: &'a HeightDataset,
    model: &'a HeightModel,
    config: &'a SampleConfig,
    engine: &'a str,
    summaries: &'a [ParameterSummary],
    draws: &'a PosteriorDraws,
    plots: &'a [PathBuf],
}

impl<'a> Report<'a> {
    /// Assemble a report over the run's artifacts.
    #[must_use]
    pub fn new(
        dataset: &'a HeightDataset,
        model: &'a HeightModel,
        config: &'a SampleConfig,
        engine: &'a str,
        summaries: &'a [ParameterSummary],
        draws: &'a PosteriorDraws,
        plots: &'a [PathBuf],
    ) -> Self {
        Self {
            dataset,
            model,
            config,
            engine,
            summaries,
            draws,
            plots,
        }
    }

    /// Render the Markdown document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let data = self.dataset.describe();

        let _ = writeln!(out, "# How tall am I?\n");
        let _ = writeln!(
            out,
            "Thirty morning-and-evening height measurements, a normal model \
             with an informative prior, and a posterior that answers the \
             question better than any single trip to the tape measure.\n"
        );

        self.render_data_section(&mut out, &data);
        self.render_model_section(&mut out);
        self.render_fit_section(&mut out);
        self.render_plots_section(&mut out);

        out
    }

    fn render_data_section(&self, out: &mut String, data: &HeightSummary) {
        let _ = writeln!(out, "## Data\n");
        let _ = writeln!(
            out,
            "{} measurements between {:.1} and {:.1} cm, mean {:.2} cm, \
             standard deviation {:.2} cm. One record carries `time_hours = 0`, \
             meaning no reliable time was written down; it is excluded from \
             the time-of-day plot but kept for the model.\n",
            data.n, data.min, data.max, data.mean, data.sd
        );
    }

    fn render_model_section(&self, out: &mut String) {
        let mu = self.model.mu_prior();
        let _ = writeln!(out, "## Model\n");
        let _ = writeln!(out, "```text");
        let _ = writeln!(out, "mu    ~ Normal({:.0}, {:.2})", mu.mean(), mu.sd());
        match self.model.sigma_spec() {
            SigmaSpec::Fixed(s) => {
                let _ = writeln!(out, "sigma = {s:.2} (fixed)");
            }
            SigmaSpec::Exponential(prior) => {
                let _ = writeln!(out, "sigma ~ Exponential({:.0})", prior.rate());
            }
        }
        let _ = writeln!(out, "h_i   ~ Normal(mu, sigma)");
        let _ = writeln!(out, "```\n");
        let _ = writeln!(
            out,
            "The prior on `mu` puts its 10th and 90th percentiles at {:.2} \
             and {:.2} cm, bracketing what I believed before measuring.\n",
            mu.quantile(0.1),
            mu.quantile(0.9)
        );
    }

    fn render_fit_section(&self, out: &mut String) {
        let _ = writeln!(out, "## Fit\n");
        let _ = writeln!(
            out,
            "Sampled with the `{}` engine: {} chains x {} post-warmup draws \
             ({} warmup iterations, target acceptance {:.2}, seed {}). \
             {} divergent transitions.\n",
            self.engine,
            self.config.chains(),
            self.config.draws(),
            self.config.warmup(),
            self.config.target_accept(),
            self.config.seed(),
            self.draws.divergences()
        );

        let _ = writeln!(out, "```text");
        let _ = write!(out, "{}", render_table(self.summaries));
        let _ = writeln!(out, "```\n");

        for summary in self.summaries {
            let _ = writeln!(
                out,
                "Posterior for `{}`: mean {:.2}, 90% credible interval \
                 [{:.2}, {:.2}], R-hat {:.3}, effective sample size {:.0}.",
                summary.name, summary.mean, summary.q5, summary.q95, summary.rhat, summary.ess
            );
        }
        let _ = writeln!(out);
    }

    fn render_plots_section(&self, out: &mut String) {
        if self.plots.is_empty() {
            return;
        }
        let _ = writeln!(out, "## Figures\n");
        for plot in self.plots {
            if let Some(name) = plot.file_name().and_then(|n| n.to_str()) {
                let stem = name.trim_end_matches(".png").replace('_', " ");
                let _ = writeln!(out, "![{stem}]({name})");
            }
        }
        let _ = writeln!(out);
    }

    /// Render and write the document to `dir/report.md`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| EstaturaError::io(dir, e))?;
        let path = dir.join("report.md");
        std::fs::write(&path, self.render()).map_err(|e| EstaturaError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
