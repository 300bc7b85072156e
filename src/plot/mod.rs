//! Plot rendering for the analysis.
//!
//! Every function takes an explicit [`PlotConfig`]; there is no
//! process-wide backend state. Output is PNG via the plotters bitmap
//! backend at the configured figure size. Height axes use the fixed
//! 194–200 cm readability range.
//!
//! Rendering is presentation only; the contract is "renders without error
//! given valid input".

use crate::dataset::{weekday_index, weekday_label, HeightDataset, WEEKDAY_ORDER};
use crate::dist::Normal;
use crate::error::{EstaturaError, Result};
use crate::ppc::PredictiveCheck;
use crate::sampler::PosteriorDraws;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Fixed height axis range (cm) for readability.
pub const HEIGHT_AXIS: (f64, f64) = (194.0, 200.0);

/// Where and how large to render.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    out_dir: PathBuf,
    width: u32,
    height: u32,
}

impl PlotConfig {
    /// Render into `out_dir` at the nominal 800×600 figure size.
    #[must_use]
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            width: 800,
            height: 600,
        }
    }

    /// Override the figure size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Output directory.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn target(&self, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)
            .map_err(|e| EstaturaError::io(&self.out_dir, e))?;
        Ok(self.out_dir.join(name))
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> EstaturaError {
    EstaturaError::Plot(e.to_string())
}

/// Scatter of height against the ordered weekday axis.
pub fn height_by_weekday(config: &PlotConfig, dataset: &HeightDataset) -> Result<PathBuf> {
    let path = config.target("height_by_weekday.png")?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Height by weekday", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..6.5, HEIGHT_AXIS.0..HEIGHT_AXIS.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_labels(7)
        .x_label_formatter(&|x: &f64| {
            let idx = x.round() as isize;
            if (0..7).contains(&idx) {
                weekday_label(WEEKDAY_ORDER[idx as usize]).to_string()
            } else {
                String::new()
            }
        })
        .y_desc("height (cm)")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(dataset.observations().iter().map(|o| {
            Circle::new(
                (weekday_index(o.weekday()) as f64, o.height_cm),
                4,
                BLUE.filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Scatter of height against time of day, on the midnight-excluded view.
pub fn height_by_time(config: &PlotConfig, dataset: &HeightDataset) -> Result<PathBuf> {
    let path = config.target("height_by_time.png")?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Height by time of day", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..24.0, HEIGHT_AXIS.0..HEIGHT_AXIS.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("hour of day")
        .y_desc("height (cm)")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            dataset
                .timed()
                .iter()
                .map(|o| Circle::new((o.time_hours, o.height_cm), 4, BLUE.filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Density of the observed heights, optionally overlaid with the prior
/// density for `mu` on the same axes.
pub fn height_density(
    config: &PlotConfig,
    dataset: &HeightDataset,
    prior: Option<&Normal>,
) -> Result<PathBuf> {
    let name = if prior.is_some() {
        "height_density_vs_prior.png"
    } else {
        "height_density.png"
    };
    let path = config.target(name)?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let grid = linspace(HEIGHT_AXIS.0, HEIGHT_AXIS.1, 256);
    let data_density = kde(&dataset.heights(), &grid);
    let prior_density: Option<Vec<f64>> =
        prior.map(|p| grid.iter().map(|&x| p.pdf(x)).collect());

    let mut y_max = data_density.iter().copied().fold(0.0_f64, f64::max);
    if let Some(pd) = &prior_density {
        y_max = y_max.max(pd.iter().copied().fold(0.0, f64::max));
    }
    let y_max = (y_max * 1.1).max(1e-6);

    let mut chart = ChartBuilder::on(&root)
        .caption("Observed height density", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(HEIGHT_AXIS.0..HEIGHT_AXIS.1, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("height (cm)")
        .y_desc("density")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            grid.iter().copied().zip(data_density.iter().copied()),
            &BLUE,
        ))
        .map_err(plot_err)?
        .label("data")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    if let Some(pd) = &prior_density {
        chart
            .draw_series(LineSeries::new(
                grid.iter().copied().zip(pd.iter().copied()),
                &RED,
            ))
            .map_err(plot_err)?
            .label("mu prior")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Trace plot: draw value against iteration, one line per chain.
pub fn trace(config: &PlotConfig, draws: &PosteriorDraws, param: usize) -> Result<PathBuf> {
    let name = &draws.names()[param];
    let path = config.target(&format!("trace_{name}.png"))?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let (y_min, y_max) = padded_range(&draws.pooled(param))?;
    let n = draws.n_draws() as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Trace of {name}"), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..n, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("iteration")
        .y_desc(name.as_str())
        .draw()
        .map_err(plot_err)?;

    for chain in draws.chains() {
        let color = Palette99::pick(chain.index).to_rgba();
        chart
            .draw_series(LineSeries::new(
                chain
                    .series(param)
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| (i as f64, v)),
                color.stroke_width(1),
            ))
            .map_err(plot_err)?
            .label(format!("chain {}", chain.index))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Per-chain density of a parameter's draws.
pub fn posterior_density(
    config: &PlotConfig,
    draws: &PosteriorDraws,
    param: usize,
) -> Result<PathBuf> {
    let name = &draws.names()[param];
    let path = config.target(&format!("density_{name}.png"))?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let (x_min, x_max) = padded_range(&draws.pooled(param))?;
    let grid = linspace(x_min, x_max, 256);

    let densities: Vec<Vec<f64>> = draws
        .chains()
        .iter()
        .map(|c| kde(c.series(param), &grid))
        .collect();
    let y_max = densities
        .iter()
        .flat_map(|d| d.iter().copied())
        .fold(0.0_f64, f64::max)
        .max(1e-6)
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Posterior density of {name}"), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(name.as_str())
        .y_desc("density")
        .draw()
        .map_err(plot_err)?;

    for (chain, density) in draws.chains().iter().zip(&densities) {
        let color = Palette99::pick(chain.index).to_rgba();
        chart
            .draw_series(LineSeries::new(
                grid.iter().copied().zip(density.iter().copied()),
                color.stroke_width(1),
            ))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Autocorrelation bars for a parameter, averaged across chains.
pub fn autocorrelation(
    config: &PlotConfig,
    draws: &PosteriorDraws,
    param: usize,
    max_lag: usize,
) -> Result<PathBuf> {
    let name = &draws.names()[param];
    let path = config.target(&format!("autocorrelation_{name}.png"))?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let chains = draws.chain_series(param);
    let m = chains.len() as f64;
    let rhos: Vec<f64> = (0..=max_lag)
        .map(|lag| {
            chains
                .iter()
                .map(|c| crate::diagnostics::autocorrelation(c, lag))
                .sum::<f64>()
                / m
        })
        .collect();

    let y_min = rhos.iter().copied().fold(0.0_f64, f64::min).min(-0.05) - 0.05;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Autocorrelation of {name}"), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(max_lag as f64 + 0.5), y_min..1.05)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("lag")
        .y_desc("autocorrelation")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(rhos.iter().enumerate().map(|(lag, &rho)| {
            PathElement::new(vec![(lag as f64, 0.0), (lag as f64, rho)], BLUE)
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Posterior-predictive overlay: pooled replicate density against the
/// observed-data density, with a reference line at the posterior mean of
/// `mu`.
pub fn predictive_overlay(
    config: &PlotConfig,
    check: &PredictiveCheck,
    dataset: &HeightDataset,
) -> Result<PathBuf> {
    let path = config.target("predictive_overlay.png")?;
    let root = BitMapBackend::new(&path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let grid = linspace(HEIGHT_AXIS.0, HEIGHT_AXIS.1, 256);
    let replicate_density = kde(&check.pooled_heights(), &grid);
    let data_density = kde(&dataset.heights(), &grid);

    let y_max = replicate_density
        .iter()
        .chain(data_density.iter())
        .copied()
        .fold(0.0_f64, f64::max)
        .max(1e-6)
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Posterior predictive check", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(HEIGHT_AXIS.0..HEIGHT_AXIS.1, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("height (cm)")
        .y_desc("density")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            grid.iter().copied().zip(replicate_density.iter().copied()),
            BLUE.mix(0.8).stroke_width(2),
        ))
        .map_err(plot_err)?
        .label("replicates")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            grid.iter().copied().zip(data_density.iter().copied()),
            BLACK.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(check.mu_mean(), 0.0), (check.mu_mean(), y_max)],
            RED.mix(0.6),
        )))
        .map_err(plot_err)?
        .label("posterior mean mu")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    drop(chart);
    drop(root);
    Ok(path)
}

/// Evenly spaced grid over [lo, hi].
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + i as f64 * step).collect()
}

/// Gaussian kernel density estimate on a grid, Silverman bandwidth.
fn kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    if values.is_empty() {
        return vec![0.0; grid.len()];
    }

    let mean = values.iter().sum::<f64>() / n;
    let sd = if values.len() > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let bw = (1.06 * sd * n.powf(-0.2)).max(1e-3);

    let norm = 1.0 / (n * bw * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|&g| {
            values
                .iter()
                .map(|&v| {
                    let z = (g - v) / bw;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

fn padded_range(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(EstaturaError::empty_input("plot series"));
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max - min) * 0.05).max(1e-6);
    Ok((min - pad, max + pad))
}

#[cfg(test)]
#[path = "plot_tests.rs"]
mod tests;
