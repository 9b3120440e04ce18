//! Entropy metrics over classified points of interest
//!
//! A metric is a taxonomy level paired with an estimator, named
//! `L0_shannon`, `L1_altieri`, and so on. [`EntropyEngine`] computes any
//! requested subset in the caller's order.

mod shannon;

use std::fmt;
use std::str::FromStr;

use geo_types::Coord;
use landmix_core::{AmenityRecord, CategoryLevel, Error, Result};
use tracing::{debug, warn};

use crate::maybe_rayon::*;
use crate::spatial::{
    Altieri, Leibovici, SpatialEntropyError, SpatialEntropyEstimator, SpatialEntropyParams,
};

pub use shannon::{category_counts, entropy_from_counts, shannon_entropy};

/// Entropy estimator family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Estimator {
    /// Frequency-only Shannon entropy
    Shannon,
    /// Altieri spatial residual entropy
    Altieri,
    /// Leibovici co-occurrence entropy
    Leibovici,
}

impl Estimator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shannon => "shannon",
            Self::Altieri => "altieri",
            Self::Leibovici => "leibovici",
        }
    }
}

/// A named metric: taxonomy level + estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricName {
    pub level: CategoryLevel,
    pub estimator: Estimator,
}

impl MetricName {
    /// Every metric, in canonical order
    pub const ALL: [MetricName; 6] = [
        MetricName::new(CategoryLevel::L0, Estimator::Shannon),
        MetricName::new(CategoryLevel::L1, Estimator::Shannon),
        MetricName::new(CategoryLevel::L0, Estimator::Altieri),
        MetricName::new(CategoryLevel::L1, Estimator::Altieri),
        MetricName::new(CategoryLevel::L0, Estimator::Leibovici),
        MetricName::new(CategoryLevel::L1, Estimator::Leibovici),
    ];

    pub const fn new(level: CategoryLevel, estimator: Estimator) -> Self {
        Self { level, estimator }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.level, self.estimator.as_str())
    }
}

impl FromStr for MetricName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownMetric(s.to_string());
        let (level, estimator) = s.split_once('_').ok_or_else(unknown)?;

        let level = match level {
            "L0" => CategoryLevel::L0,
            "L1" => CategoryLevel::L1,
            _ => return Err(unknown()),
        };
        let estimator = match estimator {
            "shannon" => Estimator::Shannon,
            "altieri" => Estimator::Altieri,
            "leibovici" => Estimator::Leibovici,
            _ => return Err(unknown()),
        };

        Ok(Self { level, estimator })
    }
}

/// Parse metric names, failing on the first unrecognized one
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> Result<Vec<MetricName>> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

/// Metric values in the order they were requested.
///
/// A value of `0.0` also stands for empty or degenerate input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntropyResult {
    values: Vec<(MetricName, f64)>,
}

impl EntropyResult {
    /// All requested metrics set to `0.0`
    pub fn zeros(metrics: &[MetricName]) -> Self {
        Self {
            values: metrics.iter().map(|&m| (m, 0.0)).collect(),
        }
    }

    /// Value of the first occurrence of `metric`
    pub fn get(&self, metric: MetricName) -> Option<f64> {
        self.values.iter().find(|(m, _)| *m == metric).map(|&(_, v)| v)
    }

    pub fn values(&self) -> Vec<f64> {
        self.values.iter().map(|&(_, v)| v).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, f64)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Computes entropy metrics over classified, filtered records.
///
/// The spatial estimators are trait objects so alternative implementations
/// can be injected with [`EntropyEngine::with_estimators`].
pub struct EntropyEngine {
    base: f64,
    altieri: Box<dyn SpatialEntropyEstimator>,
    leibovici: Box<dyn SpatialEntropyEstimator>,
}

impl fmt::Debug for EntropyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntropyEngine")
            .field("base", &self.base)
            .field("altieri", &self.altieri.name())
            .field("leibovici", &self.leibovici.name())
            .finish()
    }
}

impl EntropyEngine {
    pub fn new(params: SpatialEntropyParams) -> Result<Self> {
        params.validate().map_err(invalid_params)?;

        Ok(Self {
            base: params.base,
            altieri: Box::new(Altieri::new(params.altieri_cut, params.base).map_err(invalid_params)?),
            leibovici: Box::new(
                Leibovici::new(params.leibovici_distance, params.base).map_err(invalid_params)?,
            ),
        })
    }

    /// Engine with custom spatial estimators; Shannon uses base 2
    pub fn with_estimators(
        altieri: Box<dyn SpatialEntropyEstimator>,
        leibovici: Box<dyn SpatialEntropyEstimator>,
    ) -> Self {
        Self {
            base: 2.0,
            altieri,
            leibovici,
        }
    }

    /// Compute `metrics` over `records`, preserving the requested order.
    ///
    /// Empty `records` yield a zero vector. A spatial estimator failing on
    /// degenerate input is logged and contributes `0.0`; the remaining
    /// metrics are unaffected.
    pub fn compute(&self, records: &[AmenityRecord], metrics: &[MetricName]) -> EntropyResult {
        if records.is_empty() {
            debug!(metrics = metrics.len(), "no records, returning zero vector");
            return EntropyResult::zeros(metrics);
        }

        let points: Vec<Coord<f64>> = records.iter().map(|r| r.geometry.0).collect();

        let values = metrics
            .par_iter()
            .map(|&metric| (metric, self.compute_one(records, &points, metric)))
            .collect();

        EntropyResult { values }
    }

    /// [`compute`](Self::compute) with metric names parsed first
    pub fn compute_named<S: AsRef<str>>(
        &self,
        records: &[AmenityRecord],
        names: &[S],
    ) -> Result<EntropyResult> {
        let metrics = parse_metrics(names)?;
        Ok(self.compute(records, &metrics))
    }

    fn compute_one(&self, records: &[AmenityRecord], points: &[Coord<f64>], metric: MetricName) -> f64 {
        let labels: Vec<&str> = records.iter().map(|r| r.category(metric.level)).collect();

        let estimator = match metric.estimator {
            Estimator::Shannon => return shannon_entropy(labels, self.base),
            Estimator::Altieri => &self.altieri,
            Estimator::Leibovici => &self.leibovici,
        };

        match estimator.estimate(points, &labels) {
            Ok(h) => h,
            Err(e) => {
                warn!(%metric, estimator = estimator.name(), error = %e, "spatial estimator failed, using 0.0");
                0.0
            }
        }
    }
}

fn invalid_params(e: SpatialEntropyError) -> Error {
    match e {
        SpatialEntropyError::InvalidParameter { name, value, reason } => {
            Error::InvalidParameter { name, value, reason }
        }
        other => Error::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo_types::Point;
    use landmix_core::{Classification, RawRecord};

    fn record(x: f64, y: f64, l0: &str) -> AmenityRecord {
        let classification = Classification {
            primary_tag: Some("amenity".into()),
            secondary_tag: Some(l0.to_lowercase()),
            l0: l0.into(),
            l1: format!("{l0}_sub"),
        };
        AmenityRecord::new(RawRecord::node(0, x, y), Point::new(x, y), classification)
    }

    fn engine() -> EntropyEngine {
        EntropyEngine::new(SpatialEntropyParams {
            leibovici_distance: 1.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in MetricName::ALL {
            assert_eq!(metric.to_string().parse::<MetricName>().unwrap(), metric);
        }
        assert_eq!(MetricName::ALL[0].to_string(), "L0_shannon");
    }

    #[test]
    fn test_unknown_metric_is_an_error() {
        for bad in ["L2_shannon", "L0_simpson", "shannon", "", "l0_shannon"] {
            assert!(
                matches!(bad.parse::<MetricName>(), Err(Error::UnknownMetric(ref s)) if s == bad),
                "{bad:?} should be rejected"
            );
        }
        assert!(parse_metrics(&["L0_shannon", "L0_bogus"]).is_err());
    }

    #[test]
    fn test_empty_records_give_zero_vector() {
        let metrics = [MetricName::ALL[0], MetricName::ALL[3], MetricName::ALL[0]];
        let result = engine().compute(&[], &metrics);
        assert_eq!(result.values(), vec![0.0; 3]);
        assert_eq!(result.iter().map(|(m, _)| m).collect::<Vec<_>>(), metrics);
    }

    #[test]
    fn test_order_is_preserved() {
        let records: Vec<_> = (0..8)
            .map(|i| record(i as f64, 0.0, if i % 2 == 0 { "A" } else { "B" }))
            .collect();
        let result = engine()
            .compute_named(&records, &["L0_leibovici", "L1_shannon", "L0_altieri"])
            .unwrap();

        let names: Vec<String> = result.iter().map(|(m, _)| m.to_string()).collect();
        assert_eq!(names, ["L0_leibovici", "L1_shannon", "L0_altieri"]);
        // neighbours at distance 1 always pair A with B
        assert_abs_diff_eq!(result.values()[0], 0.0);
        assert_abs_diff_eq!(result.values()[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.values()[2], 1.4062113007133918, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_spatial_input_falls_back_to_zero() {
        // One point: Shannon is defined, spatial estimators are not
        let records = vec![record(1.0, 1.0, "A")];
        let result = engine()
            .compute_named(&records, &["L0_shannon", "L0_altieri", "L0_leibovici"])
            .unwrap();
        assert_eq!(result.values(), vec![0.0, 0.0, 0.0]);

        // Points further apart than the Leibovici distance
        let records = vec![record(0.0, 0.0, "A"), record(5.0, 0.0, "B")];
        let result = engine()
            .compute_named(&records, &["L0_shannon", "L0_leibovici"])
            .unwrap();
        assert_abs_diff_eq!(result.values()[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.values()[1], 0.0);
    }

    #[test]
    fn test_injected_estimators() {
        struct Constant;
        impl SpatialEntropyEstimator for Constant {
            fn name(&self) -> &'static str {
                "constant"
            }
            fn estimate(&self, _: &[Coord<f64>], _: &[&str]) -> crate::spatial::Result<f64> {
                Ok(42.0)
            }
        }

        let engine = EntropyEngine::with_estimators(Box::new(Constant), Box::new(Constant));
        let records = vec![record(0.0, 0.0, "A"), record(1.0, 0.0, "B")];
        let result = engine.compute_named(&records, &["L1_altieri"]).unwrap();
        assert_eq!(result.values(), vec![42.0]);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = SpatialEntropyParams {
            altieri_cut: 0,
            ..Default::default()
        };
        assert!(matches!(
            EntropyEngine::new(params),
            Err(Error::InvalidParameter { name: "altieri_cut", .. })
        ));
    }
}
