//! Spatial entropy estimators
//!
//! Both estimators look at *co-occurrences*: unordered pairs of labelled
//! points. Unlike Shannon entropy they respond to how categories are mixed
//! in space, not only to how often each category occurs.
//!
//! - **Leibovici**: entropy of co-occurrences between points closer than a
//!   fixed distance
//! - **Altieri**: co-occurrence entropy split into a spatial mutual
//!   information term and a spatial residual term over distance classes
//!
//! References:
//! Leibovici, D.G. (2009). Defining spatial entropy from multivariate
//! distributions of co-occurrences. COSIT 2009, LNCS 5756.
//! Altieri, L., Cocchi, D., Roli, G. (2018). A new approach to spatial
//! entropy measures. Environmental and Ecological Statistics, 25(1).

mod altieri;
pub mod kdtree;
mod leibovici;

use std::collections::HashMap;

use geo_types::Coord;
use thiserror::Error;

pub use altieri::{Altieri, AltieriEntropy};
pub use kdtree::KdTree;
pub use leibovici::Leibovici;

/// Failures of a spatial estimator on degenerate input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialEntropyError {
    #[error("need at least {required} points, got {actual}")]
    TooFewPoints { required: usize, actual: usize },

    #[error("{points} points but {labels} labels")]
    LengthMismatch { points: usize, labels: usize },

    #[error("point {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("all points coincide")]
    CoincidentPoints,

    #[error("no point pairs within distance {distance}")]
    NoCoOccurrences { distance: f64 },

    #[error("invalid parameter {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SpatialEntropyError>;

/// Parameters shared by the spatial estimators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntropyParams {
    /// Logarithm base (default 2, entropy in bits)
    pub base: f64,
    /// Neighbourhood distance for Leibovici co-occurrences, in coordinate
    /// units. Pipeline centroids are lon/lat, so this is in degrees; at the
    /// default of 10 every pair inside a city-sized area co-occurs.
    pub leibovici_distance: f64,
    /// Number of equal-width distance classes for Altieri
    pub altieri_cut: usize,
}

impl Default for SpatialEntropyParams {
    fn default() -> Self {
        Self {
            base: 2.0,
            leibovici_distance: 10.0,
            altieri_cut: 3,
        }
    }
}

impl SpatialEntropyParams {
    pub fn validate(&self) -> Result<()> {
        validate_base(self.base)?;
        if !(self.leibovici_distance.is_finite() && self.leibovici_distance > 0.0) {
            return Err(SpatialEntropyError::InvalidParameter {
                name: "leibovici_distance",
                value: self.leibovici_distance.to_string(),
                reason: "must be a positive finite distance".into(),
            });
        }
        if self.altieri_cut == 0 {
            return Err(SpatialEntropyError::InvalidParameter {
                name: "altieri_cut",
                value: "0".into(),
                reason: "need at least one distance class".into(),
            });
        }
        Ok(())
    }
}

/// A spatial entropy estimator over labelled points.
///
/// `points[i]` carries `labels[i]`; both slices must have equal length.
pub trait SpatialEntropyEstimator: Send + Sync {
    /// Short estimator name, used in log messages
    fn name(&self) -> &'static str;

    /// Scalar entropy of the labelled point pattern
    fn estimate(&self, points: &[Coord<f64>], labels: &[&str]) -> Result<f64>;
}

fn validate_base(base: f64) -> Result<()> {
    if base.is_finite() && base > 0.0 && base != 1.0 {
        Ok(())
    } else {
        Err(SpatialEntropyError::InvalidParameter {
            name: "base",
            value: base.to_string(),
            reason: "logarithm base must be positive and not 1".into(),
        })
    }
}

/// Common input checks: equal lengths, at least two points, finite coordinates
fn validate_input(points: &[Coord<f64>], labels: &[&str]) -> Result<()> {
    if points.len() != labels.len() {
        return Err(SpatialEntropyError::LengthMismatch {
            points: points.len(),
            labels: labels.len(),
        });
    }
    if points.len() < 2 {
        return Err(SpatialEntropyError::TooFewPoints {
            required: 2,
            actual: points.len(),
        });
    }
    if let Some(index) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(SpatialEntropyError::NonFinite { index });
    }
    Ok(())
}

/// Unordered label pair
type CoOccurrence<'l> = (&'l str, &'l str);

fn co_occurrence<'l>(a: &'l str, b: &'l str) -> CoOccurrence<'l> {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

fn count_entropy(counts: &HashMap<CoOccurrence<'_>, usize>, base: f64) -> f64 {
    crate::entropy::entropy_from_counts(counts.values().copied(), base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(SpatialEntropyParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_params() {
        let bad_base = SpatialEntropyParams { base: 1.0, ..Default::default() };
        assert!(matches!(
            bad_base.validate(),
            Err(SpatialEntropyError::InvalidParameter { name: "base", .. })
        ));

        let bad_distance = SpatialEntropyParams { leibovici_distance: f64::NAN, ..Default::default() };
        assert!(bad_distance.validate().is_err());

        let bad_cut = SpatialEntropyParams { altieri_cut: 0, ..Default::default() };
        assert!(bad_cut.validate().is_err());
    }

    #[test]
    fn test_input_checks() {
        let pts = [Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: f64::INFINITY }];

        assert_eq!(
            validate_input(&pts, &["a"]),
            Err(SpatialEntropyError::LengthMismatch { points: 2, labels: 1 })
        );
        assert_eq!(
            validate_input(&pts[..1], &["a"]),
            Err(SpatialEntropyError::TooFewPoints { required: 2, actual: 1 })
        );
        assert_eq!(
            validate_input(&pts, &["a", "b"]),
            Err(SpatialEntropyError::NonFinite { index: 1 })
        );
    }

    #[test]
    fn test_co_occurrences_are_unordered() {
        assert_eq!(co_occurrence("b", "a"), co_occurrence("a", "b"));
    }
}
