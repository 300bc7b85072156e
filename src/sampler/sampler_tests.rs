use super::*;
use crate::model::{HeightModel, LikelihoodMode};

fn synthetic_observations() -> Vec<f64> {
    // Deterministic pseudo-data centered on 196.5 with spread ~0.6.
    (0..30)
        .map(|i| 196.5 + 0.6 * ((i as f64 * 0.7).sin()))
        .collect()
}

#[test]
fn test_config_defaults_are_canonical() {
    let config = SampleConfig::new();
    assert_eq!(config.chains(), 4);
    assert_eq!(config.draws(), 1000);
    assert_eq!(config.warmup(), 1000);
    assert!((config.target_accept() - 0.8).abs() < 1e-12);
    assert!(config.discard_warmup());
}

#[test]
fn test_config_builder() {
    let config = SampleConfig::new()
        .with_chains(8)
        .with_draws(250)
        .with_warmup(100)
        .with_target_accept(0.9)
        .with_seed(7)
        .keep_warmup();
    assert_eq!(config.chains(), 8);
    assert_eq!(config.draws(), 250);
    assert_eq!(config.warmup(), 100);
    assert_eq!(config.seed(), 7);
    assert!(!config.discard_warmup());
}

#[test]
fn test_config_validation() {
    let model = HeightModel::new(synthetic_observations()).expect("valid model");
    let sampler = PriorSampler::new();

    assert!(sample(&model, &sampler, &SampleConfig::new().with_chains(0)).is_err());
    assert!(sample(&model, &sampler, &SampleConfig::new().with_draws(0)).is_err());
    assert!(sample(&model, &sampler, &SampleConfig::new().with_target_accept(1.5)).is_err());
}

#[test]
fn test_hmc_rejects_bad_settings() {
    assert!(Hmc::new(0.0, 10).is_err());
    assert!(Hmc::new(-0.1, 10).is_err());
    assert!(Hmc::new(0.05, 0).is_err());
    assert!(Nuts::new().with_max_depth(0).is_err());
}

#[test]
fn test_prior_sampler_matches_priors() {
    let model = HeightModel::new(synthetic_observations())
        .expect("valid model")
        .with_mode(LikelihoodMode::Predictive);
    let config = SampleConfig::new()
        .with_chains(2)
        .with_draws(5000)
        .with_seed(9);

    let draws = sample(&model, &PriorSampler::new(), &config).expect("prior draws");
    assert_eq!(draws.names(), &["mu".to_string(), "sigma".to_string()]);

    let mu = draws.pooled(0);
    let mu_mean = mu.iter().sum::<f64>() / mu.len() as f64;
    // mu prior is Normal(196, 0.75); se ~ 0.75/sqrt(10000) = 0.0075.
    assert!((mu_mean - 196.0).abs() < 0.05, "prior mu mean {mu_mean}");

    let sigma = draws.pooled(1);
    let sigma_mean = sigma.iter().sum::<f64>() / sigma.len() as f64;
    // sigma prior is Exponential(1) with mean 1.
    assert!((sigma_mean - 1.0).abs() < 0.08, "prior sigma mean {sigma_mean}");
    assert!(sigma.iter().all(|&s| s > 0.0));
}

#[test]
fn test_hmc_recovers_conjugate_posterior_mean() {
    // With sigma fixed the posterior for mu is available in closed form:
    // precision-weighted combination of prior and data.
    let observations = vec![196.5; 20];
    let model = HeightModel::new(observations.clone())
        .expect("valid model")
        .with_fixed_sigma(0.5)
        .expect("valid sigma");

    let prior_prec = 1.0 / (0.75_f64 * 0.75);
    let data_prec = 20.0 / (0.5_f64 * 0.5);
    let expected = (196.0 * prior_prec + 196.5 * data_prec) / (prior_prec + data_prec);

    let sampler = Hmc::new(0.05, 20).expect("valid engine");
    let config = SampleConfig::new()
        .with_chains(2)
        .with_draws(2000)
        .with_warmup(500)
        .with_seed(4);

    let draws = sample(&model, &sampler, &config).expect("posterior draws");
    let mu = draws.pooled(0);
    let mu_mean = mu.iter().sum::<f64>() / mu.len() as f64;

    assert!(
        (mu_mean - expected).abs() < 0.05,
        "posterior mean {mu_mean}, expected {expected}"
    );
}

#[test]
fn test_nuts_chain_shapes_and_tags() {
    let model = HeightModel::new(synthetic_observations()).expect("valid model");
    let config = SampleConfig::new()
        .with_chains(3)
        .with_draws(200)
        .with_warmup(200)
        .with_seed(12);

    let draws = sample(&model, &Nuts::new(), &config).expect("posterior draws");

    assert_eq!(draws.n_chains(), 3);
    assert_eq!(draws.n_draws(), 200);
    for (i, chain) in draws.chains().iter().enumerate() {
        assert_eq!(chain.index, i);
        assert_eq!(chain.n_draws(), 200);
        assert!(chain.accept_rate > 0.0 && chain.accept_rate <= 1.0);
    }
    assert_eq!(draws.pooled(0).len(), 600);
}

#[test]
fn test_sampling_is_reproducible() {
    let model = HeightModel::new(synthetic_observations()).expect("valid model");
    let config = SampleConfig::new()
        .with_chains(2)
        .with_draws(100)
        .with_warmup(100)
        .with_seed(99);

    let a = sample(&model, &Nuts::new(), &config).expect("first run");
    let b = sample(&model, &Nuts::new(), &config).expect("second run");

    for param in 0..2 {
        assert_eq!(a.pooled(param), b.pooled(param));
    }
}

#[test]
fn test_keep_warmup_retains_all_iterations() {
    let model = HeightModel::new(synthetic_observations()).expect("valid model");
    let sampler = Hmc::new(0.05, 10).expect("valid engine");
    let config = SampleConfig::new()
        .with_chains(1)
        .with_draws(50)
        .with_warmup(25)
        .with_seed(1)
        .keep_warmup();

    let draws = sample(&model, &sampler, &config).expect("draws");
    assert_eq!(draws.n_draws(), 75);
}
