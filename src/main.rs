//! The analysis, run top to bottom: load, plot, fit, diagnose, check,
//! report. No arguments; the only outputs are PNGs, `report.md` and the
//! printed summaries.

use estatura::dataset::HeightDataset;
use estatura::diagnostics::{render_table, summarize};
use estatura::model::HeightModel;
use estatura::plot::{self, PlotConfig};
use estatura::ppc::{PredictiveCheck, DEFAULT_SUBSAMPLE};
use estatura::report::Report;
use estatura::sampler::{sample, Nuts, Sampler, SampleConfig};
use estatura::Result;

const DATA_PATH: &str = "data/heights.csv";
const OUT_DIR: &str = "plots";

fn main() -> Result<()> {
    println!("Loading {DATA_PATH}...");
    let dataset = HeightDataset::from_csv(DATA_PATH)?;
    println!("{}\n", dataset.describe());

    let model = HeightModel::new(dataset.heights())?;
    let plot_config = PlotConfig::new(OUT_DIR);
    let mut plots = Vec::new();

    println!("Rendering descriptive plots...");
    plots.push(plot::height_by_weekday(&plot_config, &dataset)?);
    plots.push(plot::height_by_time(&plot_config, &dataset)?);
    plots.push(plot::height_density(&plot_config, &dataset, None)?);
    let prior = model.mu_prior();
    plots.push(plot::height_density(&plot_config, &dataset, Some(&prior))?);

    let engine = Nuts::new();
    let config = SampleConfig::new();
    println!(
        "Sampling with {}: {} chains, {} draws + {} warmup each...",
        engine.name(),
        config.chains(),
        config.draws(),
        config.warmup()
    );
    let draws = sample(&model, &engine, &config)?;
    if draws.divergences() > 0 {
        println!("  {} divergent transitions", draws.divergences());
    }

    let summaries = summarize(&draws)?;
    println!("\n{}", render_table(&summaries));

    println!("Rendering diagnostics...");
    for param in 0..draws.names().len() {
        plots.push(plot::trace(&plot_config, &draws, param)?);
        plots.push(plot::posterior_density(&plot_config, &draws, param)?);
        plots.push(plot::autocorrelation(&plot_config, &draws, param, 30)?);
    }

    println!("Posterior predictive check ({DEFAULT_SUBSAMPLE} replicates)...");
    let check = PredictiveCheck::generate(&draws, &model, DEFAULT_SUBSAMPLE, config.seed())?;
    plots.push(plot::predictive_overlay(&plot_config, &check, &dataset)?);

    let report = Report::new(
        &dataset,
        &model,
        &config,
        engine.name(),
        &summaries,
        &draws,
        &plots,
    );
    let report_path = report.write(OUT_DIR)?;
    println!("Report written to {}", report_path.display());

    Ok(())
}
