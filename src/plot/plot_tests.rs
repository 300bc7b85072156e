use super::*;
use crate::dataset::Observation;
use crate::model::HeightModel;
use crate::ppc::PredictiveCheck;
use crate::sampler::{sample, PriorSampler, SampleConfig};
use chrono::NaiveDate;

fn toy_dataset() -> HeightDataset {
    let start = NaiveDate::from_ymd_opt(2024, 1, 8).expect("valid date");
    let observations: Vec<Observation> = (0..12)
        .map(|i| Observation {
            date: start + chrono::Days::new(i),
            time_hours: if i == 3 { 0.0 } else { 7.0 + (i % 16) as f64 },
            height_cm: 196.5 + 0.6 * ((i as f64 * 0.9).sin()),
        })
        .collect();
    HeightDataset::from_observations(observations).expect("valid dataset")
}

fn toy_draws() -> (crate::sampler::PosteriorDraws, HeightModel) {
    let model = HeightModel::new(toy_dataset().heights()).expect("valid model");
    let config = SampleConfig::new()
        .with_chains(2)
        .with_draws(200)
        .with_seed(3);
    let draws = sample(&model, &PriorSampler::new(), &config).expect("draws");
    (draws, model)
}

fn assert_rendered(path: &std::path::Path) {
    assert!(path.exists(), "missing plot {}", path.display());
    let len = std::fs::metadata(path).expect("metadata").len();
    assert!(len > 0, "empty plot {}", path.display());
}

#[test]
fn test_descriptive_plots_render() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PlotConfig::new(dir.path());
    let dataset = toy_dataset();

    assert_rendered(&height_by_weekday(&config, &dataset).expect("weekday plot"));
    assert_rendered(&height_by_time(&config, &dataset).expect("time plot"));
    assert_rendered(&height_density(&config, &dataset, None).expect("density plot"));

    let prior = crate::dist::Normal::new(196.0, 0.75).expect("valid prior");
    let overlay = height_density(&config, &dataset, Some(&prior)).expect("prior overlay");
    assert!(overlay.ends_with("height_density_vs_prior.png"));
    assert_rendered(&overlay);
}

#[test]
fn test_sampler_plots_render() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PlotConfig::new(dir.path());
    let (draws, _) = toy_draws();

    for param in 0..draws.names().len() {
        assert_rendered(&trace(&config, &draws, param).expect("trace plot"));
        assert_rendered(&posterior_density(&config, &draws, param).expect("density plot"));
        assert_rendered(&autocorrelation(&config, &draws, param, 30).expect("acf plot"));
    }
}

#[test]
fn test_predictive_overlay_renders() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PlotConfig::new(dir.path());
    let dataset = toy_dataset();
    let (draws, model) = toy_draws();

    let check = PredictiveCheck::generate(&draws, &model, 100, 13).expect("replicates");
    assert_rendered(&predictive_overlay(&config, &check, &dataset).expect("overlay plot"));
}

#[test]
fn test_kde_integrates_to_one() {
    let values: Vec<f64> = (0..200).map(|i| 196.0 + 0.01 * i as f64).collect();
    let grid = linspace(190.0, 202.0, 1200);
    let density = kde(&values, &grid);

    let step = grid[1] - grid[0];
    let mass: f64 = density.iter().sum::<f64>() * step;
    assert!((mass - 1.0).abs() < 0.02, "KDE mass {mass}");
    assert!(density.iter().all(|&d| d >= 0.0));
}

#[test]
fn test_plot_config_size_override() {
    let config = PlotConfig::new("plots").with_size(400, 300);
    assert_eq!(config.out_dir(), std::path::Path::new("plots"));
}
