//! End-to-end tests for the height analysis pipeline.
//!
//! These exercise the workflows the report runs: loading the bundled
//! dataset, fitting with NUTS, checking convergence, and generating the
//! posterior predictive replicates.

use estatura::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

fn bundled_data() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/heights.csv")
}

#[test]
fn test_parameter_recovery_from_synthetic_data() {
    // Data generated exactly from Normal(196, 0.5) with a large sample:
    // the posterior mean of mu must land within +/-0.1 of the truth.
    let truth = Normal::new(196.0, 0.5).expect("valid distribution");
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let heights: Vec<f64> = (0..400).map(|_| truth.sample(&mut rng)).collect();

    let model = HeightModel::new(heights).expect("valid model");
    let config = SampleConfig::new()
        .with_chains(2)
        .with_draws(500)
        .with_warmup(500)
        .with_seed(1);

    let draws = sample(&model, &Nuts::new(), &config).expect("posterior draws");
    let summaries = summarize(&draws).expect("summaries");

    let mu = &summaries[0];
    assert_eq!(mu.name, "mu");
    assert!(
        (mu.mean - 196.0).abs() < 0.1,
        "posterior mean of mu: {}",
        mu.mean
    );

    let sigma = &summaries[1];
    assert!(
        (sigma.mean - 0.5).abs() < 0.1,
        "posterior mean of sigma: {}",
        sigma.mean
    );
}

#[test]
fn test_bundled_dataset_contract() {
    let dataset = HeightDataset::from_csv(bundled_data()).expect("bundled data loads");

    assert_eq!(dataset.len(), 30);
    let summary = dataset.describe();
    assert!((summary.mean - 196.5).abs() < 0.1, "mean {}", summary.mean);
    assert!((summary.sd - 0.6).abs() < 0.1, "sd {}", summary.sd);

    // Exactly one midnight placeholder record.
    assert_eq!(dataset.len() - dataset.timed().len(), 1);

    // Weekday labels stay inside the canonical seven.
    use estatura::dataset::{weekday_label, WEEKDAY_ORDER};
    for day in dataset.weekdays() {
        assert!(WEEKDAY_ORDER.contains(&day));
        assert!(!weekday_label(day).is_empty());
    }
}

#[test]
fn test_canonical_run_converges() {
    // The report's configuration: 4 chains x 1000 post-warmup draws.
    // Both parameters must satisfy R-hat <= 1.01 and ESS >= 400.
    let dataset = HeightDataset::from_csv(bundled_data()).expect("bundled data loads");
    let model = HeightModel::new(dataset.heights()).expect("valid model");

    let config = SampleConfig::new();
    let draws = sample(&model, &Nuts::new(), &config).expect("posterior draws");
    assert_eq!(draws.n_chains(), 4);
    assert_eq!(draws.n_draws(), 1000);

    let summaries = summarize(&draws).expect("summaries");
    for summary in &summaries {
        assert!(
            summary.rhat <= 1.01,
            "{}: rhat {}",
            summary.name,
            summary.rhat
        );
        assert!(
            summary.ess >= 400.0,
            "{}: ess {}",
            summary.name,
            summary.ess
        );
    }

    // The posterior concentrates near the data.
    let mu = &summaries[0];
    assert!((mu.mean - 196.5).abs() < 0.3, "mu mean {}", mu.mean);
    assert!(mu.q5 < mu.mean && mu.mean < mu.q95);
}

#[test]
fn test_full_pipeline_artifacts() {
    let dataset = HeightDataset::from_csv(bundled_data()).expect("bundled data loads");
    let model = HeightModel::new(dataset.heights()).expect("valid model");

    let config = SampleConfig::new()
        .with_chains(2)
        .with_draws(300)
        .with_warmup(300)
        .with_seed(6);
    let draws = sample(&model, &Nuts::new(), &config).expect("posterior draws");
    let summaries = summarize(&draws).expect("summaries");

    let dir = tempfile::tempdir().expect("temp dir");
    let plot_config = PlotConfig::new(dir.path());

    let mut plots = Vec::new();
    plots.push(
        estatura::plot::height_by_weekday(&plot_config, &dataset).expect("weekday plot"),
    );
    plots.push(estatura::plot::height_by_time(&plot_config, &dataset).expect("time plot"));
    let prior = model.mu_prior();
    plots.push(
        estatura::plot::height_density(&plot_config, &dataset, Some(&prior))
            .expect("density plot"),
    );
    for param in 0..draws.names().len() {
        plots.push(estatura::plot::trace(&plot_config, &draws, param).expect("trace plot"));
    }

    let check = PredictiveCheck::generate(&draws, &model, 200, config.seed()).expect("replicates");
    plots.push(
        estatura::plot::predictive_overlay(&plot_config, &check, &dataset).expect("overlay"),
    );

    for plot in &plots {
        assert!(plot.exists(), "missing artifact {}", plot.display());
    }

    let report = estatura::report::Report::new(
        &dataset,
        &model,
        &config,
        "nuts",
        &summaries,
        &draws,
        &plots,
    );
    let report_path = report.write(dir.path()).expect("write report");
    let text = std::fs::read_to_string(report_path).expect("read report");
    assert!(text.contains("How tall am I?"));
    assert!(text.contains("90% credible interval"));
}

#[test]
fn test_prior_only_run_matches_prior_percentiles() {
    // The prior-predictive comparison uses the same model with the
    // likelihood switched off.
    let dataset = HeightDataset::from_csv(bundled_data()).expect("bundled data loads");
    let model = HeightModel::new(dataset.heights())
        .expect("valid model")
        .with_mode(LikelihoodMode::Predictive);

    let config = SampleConfig::new()
        .with_chains(4)
        .with_draws(4000)
        .with_seed(10);
    let draws = sample(&model, &PriorSampler::new(), &config).expect("prior draws");

    let mu = draws.pooled(0);
    let q10 = estatura::diagnostics::quantile(&mu, 0.1).expect("quantile");
    let q90 = estatura::diagnostics::quantile(&mu, 0.9).expect("quantile");

    let prior = model.mu_prior();
    assert!((q10 - prior.quantile(0.1)).abs() < 0.05, "q10 {q10}");
    assert!((q90 - prior.quantile(0.9)).abs() < 0.05, "q90 {q90}");
}
