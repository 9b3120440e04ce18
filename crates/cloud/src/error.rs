//! Error types for the Overpass client.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the Overpass client.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    /// The server stopped early (timeout or memory limit); the element list
    /// is incomplete.
    #[error("partial Overpass response: {0}")]
    Partial(String),

    #[error("invalid Overpass response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("core error: {0}")]
    Core(#[from] landmix_core::Error),
}

impl CloudError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Cancelled | Self::Partial(_) | Self::Decode(_) | Self::Core(_) => false,
        }
    }
}

/// Record sources report failures as core errors; the pipeline logs them and
/// continues with an empty record set.
impl From<CloudError> for landmix_core::Error {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::Core(inner) => inner,
            other => landmix_core::Error::Source(other.to_string()),
        }
    }
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;
