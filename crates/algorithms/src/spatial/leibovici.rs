//! Leibovici spatial entropy
//!
//! Entropy of the co-occurrences between points that lie within a fixed
//! distance of each other. Categories that are well mixed at that scale
//! give many distinct co-occurrence types and a high entropy; categories
//! that form homogeneous clusters mostly pair with themselves.

use std::collections::HashMap;

use geo_types::Coord;
use tracing::trace;

use super::{
    co_occurrence, count_entropy, validate_base, validate_input, CoOccurrence, KdTree, Result,
    SpatialEntropyError, SpatialEntropyEstimator,
};

/// Leibovici estimator with a fixed neighbourhood distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leibovici {
    distance: f64,
    base: f64,
}

impl Leibovici {
    pub fn new(distance: f64, base: f64) -> Result<Self> {
        validate_base(base)?;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(SpatialEntropyError::InvalidParameter {
                name: "distance",
                value: distance.to_string(),
                reason: "must be a positive finite distance".into(),
            });
        }
        Ok(Self { distance, base })
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Count the unordered label pairs of points at most `distance` apart
    fn co_occurrences<'l>(
        &self,
        points: &[Coord<f64>],
        labels: &[&'l str],
    ) -> HashMap<CoOccurrence<'l>, usize> {
        let tree = KdTree::build(points);
        let mut counts = HashMap::new();

        for (i, &p) in points.iter().enumerate() {
            for j in tree.within_radius(p, self.distance) {
                // each pair once, never a point with itself
                if j > i {
                    *counts.entry(co_occurrence(labels[i], labels[j])).or_insert(0) += 1;
                }
            }
        }
        counts
    }
}

impl SpatialEntropyEstimator for Leibovici {
    fn name(&self) -> &'static str {
        "leibovici"
    }

    fn estimate(&self, points: &[Coord<f64>], labels: &[&str]) -> Result<f64> {
        validate_input(points, labels)?;

        let counts = self.co_occurrences(points, labels);
        if counts.is_empty() {
            return Err(SpatialEntropyError::NoCoOccurrences {
                distance: self.distance,
            });
        }
        trace!(
            pairs = counts.values().sum::<usize>(),
            kinds = counts.len(),
            "leibovici co-occurrences"
        );

        Ok(count_entropy(&counts, self.base))
    }
}
