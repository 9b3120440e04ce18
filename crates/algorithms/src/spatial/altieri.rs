//! Altieri spatial entropy
//!
//! Every unordered point pair is a co-occurrence `Z`. Pair distances are
//! binned into `cut` equal-width classes `W` over `[0, max distance]`, and
//! the co-occurrence entropy decomposes as
//!
//! `H(Z) = MI(Z, W) + Σ_w p(w) · H(Z | w)`
//!
//! The first term (spatial mutual information) measures how much the
//! distance between two points tells about their category pair; the second
//! (spatial residual entropy) is the category-pair diversity remaining
//! within each distance class. `H(Z)` alone depends only on category
//! frequencies, so the residual is the scalar reported by [`Altieri`].

use std::collections::HashMap;

use geo_types::Coord;

use super::{
    co_occurrence, count_entropy, distance, validate_base, validate_input, CoOccurrence,
    Result, SpatialEntropyError, SpatialEntropyEstimator,
};

/// Altieri decomposition of the co-occurrence entropy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltieriEntropy {
    /// Spatial mutual information `MI(Z, W)`
    pub mutual_information: f64,
    /// Spatial global residual entropy `Σ_w p(w) · H(Z | w)`
    pub residual: f64,
}

impl AltieriEntropy {
    /// Total co-occurrence entropy `H(Z)`
    pub fn total(&self) -> f64 {
        self.mutual_information + self.residual
    }
}

/// Altieri estimator with a fixed number of distance classes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Altieri {
    cut: usize,
    base: f64,
}

impl Altieri {
    pub fn new(cut: usize, base: f64) -> Result<Self> {
        validate_base(base)?;
        if cut == 0 {
            return Err(SpatialEntropyError::InvalidParameter {
                name: "cut",
                value: "0".into(),
                reason: "need at least one distance class".into(),
            });
        }
        Ok(Self { cut, base })
    }

    pub fn cut(&self) -> usize {
        self.cut
    }

    /// Full decomposition of the co-occurrence entropy.
    ///
    /// O(n²) in the number of points; pairs are visited twice (once for the
    /// maximum distance, once for binning) instead of being stored.
    pub fn decompose(&self, points: &[Coord<f64>], labels: &[&str]) -> Result<AltieriEntropy> {
        validate_input(points, labels)?;

        let n = points.len();
        let mut max_distance = 0.0_f64;
        for i in 0..n {
            for j in (i + 1)..n {
                max_distance = max_distance.max(distance(points[i], points[j]));
            }
        }
        if max_distance <= 0.0 {
            return Err(SpatialEntropyError::CoincidentPoints);
        }

        let cut = self.cut as f64;
        let mut overall: HashMap<CoOccurrence<'_>, usize> = HashMap::new();
        let mut per_class: Vec<HashMap<CoOccurrence<'_>, usize>> = vec![HashMap::new(); self.cut];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(points[i], points[j]);
                let class = ((d / max_distance * cut).floor() as usize).min(self.cut - 1);
                let z = co_occurrence(labels[i], labels[j]);

                *overall.entry(z).or_insert(0) += 1;
                *per_class[class].entry(z).or_insert(0) += 1;
            }
        }

        let total_pairs = (n * (n - 1) / 2) as f64;
        let residual: f64 = per_class
            .iter()
            .filter(|counts| !counts.is_empty())
            .map(|counts| {
                let class_pairs: usize = counts.values().sum();
                class_pairs as f64 / total_pairs * count_entropy(counts, self.base)
            })
            .sum();

        let total = count_entropy(&overall, self.base);
        // Clamp the rounding noise that can push MI slightly below zero
        let mutual_information = (total - residual).max(0.0);

        Ok(AltieriEntropy {
            mutual_information,
            residual,
        })
    }
}

impl SpatialEntropyEstimator for Altieri {
    fn name(&self) -> &'static str {
        "altieri"
    }

    fn estimate(&self, points: &[Coord<f64>], labels: &[&str]) -> Result<f64> {
        self.decompose(points, labels).map(|e| e.residual)
    }
}
