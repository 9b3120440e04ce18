//! # landmix algorithms
//!
//! Diversity measures over classified points of interest.
//!
//! ## Modules
//!
//! - **entropy**: Shannon, Altieri and Leibovici metrics at both taxonomy levels
//! - **spatial**: the co-occurrence estimators and their k-d tree
//! - **pipeline**: fetch, clean, classify, filter and compute for one area

pub mod entropy;
pub mod pipeline;
pub mod spatial;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::entropy::{
        category_counts, shannon_entropy, EntropyEngine, EntropyResult, Estimator, MetricName,
    };
    pub use crate::pipeline::{AreaAmenityPipeline, BuildingSplit, PipelineOptions};
    pub use crate::spatial::{
        Altieri, Leibovici, SpatialEntropyError, SpatialEntropyEstimator, SpatialEntropyParams,
    };
    pub use landmix_core::prelude::*;
}
