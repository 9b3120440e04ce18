//! Error types for landmix

use thiserror::Error;

/// Main error type for landmix operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("taxonomy table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid area geometry: expected Polygon or MultiPolygon, got {0}")]
    InvalidArea(String),

    #[error("Unknown entropy metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid filter level: {0} (expected 0, 1 or 2)")]
    InvalidFilterLevel(u8),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("record source failed: {0}")]
    Source(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for landmix operations
pub type Result<T> = std::result::Result<T, Error>;
