//! # landmix cloud
//!
//! Overpass API client that supplies raw map records to the landmix
//! pipeline.
//!
//! ## Features
//!
//! - `native` (default): blocking [`blocking::OverpassSource`] that
//!   implements `landmix_core::RecordSource` on an internal tokio runtime

pub mod error;
pub mod models;
pub mod overpass;

pub mod sync_api;

pub use error::{CloudError, Result};
pub use models::OverpassResponse;
pub use overpass::{OverpassClient, OverpassClientOptions, OverpassEndpoint, OverpassQuery};

/// Blocking API re-exported as `blocking` module (native only).
#[cfg(feature = "native")]
pub mod blocking {
    pub use crate::sync_api::*;
}
