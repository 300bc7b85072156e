//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use estatura::prelude::*;
//! ```

pub use crate::dataset::{HeightDataset, Observation};
pub use crate::diagnostics::{summarize, ParameterSummary};
pub use crate::dist::{Exponential, Normal};
pub use crate::error::{EstaturaError, Result};
pub use crate::model::{HeightModel, LikelihoodMode, SigmaSpec};
pub use crate::plot::PlotConfig;
pub use crate::ppc::PredictiveCheck;
pub use crate::sampler::{
    sample, Hmc, Nuts, PosteriorDraws, PriorSampler, SampleConfig, Sampler,
};
