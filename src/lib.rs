//! Estatura: Bayesian analysis of personal height measurements.
//!
//! Loads a small table of height measurements, fits a normal model with an
//! informative prior on the population mean and an exponential prior on
//! the population standard deviation, draws posterior samples over
//! parallel Hamiltonian chains, and renders diagnostic plots, a posterior
//! predictive check and a narrative report.
//!
//! # Quick Start
//!
//! ```
//! use estatura::prelude::*;
//!
//! // Thirty measurements around 196.5 cm.
//! let heights: Vec<f64> = (0..30)
//!     .map(|i| 196.5 + 0.6 * ((i as f64) * 0.7).sin())
//!     .collect();
//!
//! let model = HeightModel::new(heights).unwrap();
//! let config = SampleConfig::new()
//!     .with_chains(2)
//!     .with_draws(200)
//!     .with_warmup(200);
//!
//! let draws = sample(&model, &Nuts::new(), &config).unwrap();
//! let summaries = summarize(&draws).unwrap();
//!
//! // The posterior mean lands near the data mean.
//! assert!((summaries[0].mean - 196.5).abs() < 0.5);
//! ```
//!
//! # Modules
//!
//! - [`dataset`]: CSV loading, weekday derivation, descriptive summaries
//! - [`dist`]: the Normal and Exponential families the model quotes
//! - [`model`]: the declarative generative-model record
//! - [`sampler`]: the inference engines (HMC, NUTS, prior-only)
//! - [`diagnostics`]: split R-hat, effective sample size, summaries
//! - [`ppc`]: posterior predictive replicate generation
//! - [`plot`]: plot rendering with an explicit configuration
//! - [`report`]: the narrative Markdown report

pub mod dataset;
pub mod diagnostics;
pub mod dist;
pub mod error;
pub mod model;
pub mod plot;
pub mod ppc;
pub mod prelude;
pub mod report;
pub mod sampler;

pub use error::{EstaturaError, Result};
