//! Area pipeline: fetch → clean → classify → filter → compute
//!
//! Every call is independent. Nothing is cached between runs, and a failed
//! fetch is treated as an area without records.

use std::fmt;

use geo_types::{Geometry, Point};
use landmix_core::source::count_by_type;
use landmix_core::{
    AmenityRecord, Area, BoundingBox, FilterProfile, GeometryBuilder, RawRecord, RecordSource,
    Result, TaxonomyClassifier,
};
use tracing::{debug, warn};

use crate::entropy::{parse_metrics, EntropyEngine, EntropyResult, MetricName};
use crate::maybe_rayon::*;
use crate::spatial::SpatialEntropyParams;

/// Pipeline configuration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineOptions {
    pub spatial: SpatialEntropyParams,
}

/// Stages of a single pipeline run, logged at `debug` on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetching,
    Cleaning,
    Classifying,
    Filtering,
    Computing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Cleaning => "cleaning",
            Self::Classifying => "classifying",
            Self::Filtering => "filtering",
            Self::Computing => "computing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Building footprints split by the study area
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingSplit {
    /// Footprints lying entirely within the area
    pub inside: Vec<Geometry<f64>>,
    /// Everything else returned for the area's bounding box
    pub outside: Vec<Geometry<f64>>,
}

/// Orchestrates a full land-use diversity run for one area.
///
/// The taxonomy is shared read-only, so one pipeline can serve any number
/// of concurrent runs.
pub struct AreaAmenityPipeline<S: RecordSource> {
    source: S,
    classifier: TaxonomyClassifier,
    builder: GeometryBuilder,
    engine: EntropyEngine,
}

impl<S: RecordSource> fmt::Debug for AreaAmenityPipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaAmenityPipeline")
            .field("taxonomy_rows", &self.classifier.table().len())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<S: RecordSource> AreaAmenityPipeline<S> {
    pub fn new(source: S, classifier: TaxonomyClassifier, options: PipelineOptions) -> Result<Self> {
        let engine = EntropyEngine::new(options.spatial)?;
        Ok(Self::with_engine(source, classifier, engine))
    }

    pub fn with_engine(source: S, classifier: TaxonomyClassifier, engine: EntropyEngine) -> Self {
        Self {
            source,
            classifier,
            builder: GeometryBuilder::new(),
            engine,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn classifier(&self) -> &TaxonomyClassifier {
        &self.classifier
    }

    /// Entropy metrics for the points of interest inside `area`.
    ///
    /// The area geometry, filter level and metric names are validated before
    /// anything is fetched. An empty record set at any stage yields a zero
    /// vector of the requested length.
    pub fn compute_area_entropies<N: AsRef<str>>(
        &self,
        area: &Geometry<f64>,
        filter_level: u8,
        metric_names: &[N],
    ) -> Result<EntropyResult> {
        let area = Area::from_geometry(area.clone())?;
        let profile = FilterProfile::level(filter_level)?;
        let metrics = parse_metrics(metric_names)?;

        Ok(self.run(&area, &profile, &metrics))
    }

    /// Classified records inside `area` that survive the filter profile
    pub fn categorize(&self, area: &Geometry<f64>, filter_level: u8) -> Result<Vec<AmenityRecord>> {
        let area = Area::from_geometry(area.clone())?;
        let profile = FilterProfile::level(filter_level)?;

        let records = self.collect(&area, &profile);
        stage(PipelineStage::Done);
        Ok(records)
    }

    /// Building footprints around `area`, split by containment
    pub fn buildings(&self, area: &Geometry<f64>) -> Result<BuildingSplit> {
        let area = Area::from_geometry(area.clone())?;
        let Some(bbox) = area.bounding_box() else {
            return Ok(BuildingSplit::default());
        };

        let raw = self
            .source
            .fetch_buildings(&bbox)
            .unwrap_or_else(|e| {
                warn!(error = %e, "building fetch failed, treating as empty");
                Vec::new()
            });

        let mut split = BuildingSplit::default();
        for geometry in raw.iter().filter_map(|r| self.builder.build(r)) {
            if area.contains_geometry(&geometry) {
                split.inside.push(geometry);
            } else {
                split.outside.push(geometry);
            }
        }
        debug!(
            inside = split.inside.len(),
            outside = split.outside.len(),
            "buildings split"
        );
        Ok(split)
    }

    /// [`compute_area_entropies`](Self::compute_area_entropies) for many
    /// areas in parallel, results in input order. An invalid area fails
    /// only its own entry.
    pub fn compute_many<N: AsRef<str> + Sync>(
        &self,
        areas: &[Geometry<f64>],
        filter_level: u8,
        metric_names: &[N],
    ) -> Vec<Result<EntropyResult>> {
        areas
            .par_iter()
            .map(|area| self.compute_area_entropies(area, filter_level, metric_names))
            .collect()
    }

    fn run(&self, area: &Area, profile: &FilterProfile, metrics: &[MetricName]) -> EntropyResult {
        let records = self.collect(area, profile);
        if records.is_empty() {
            stage(PipelineStage::Done);
            return EntropyResult::zeros(metrics);
        }

        stage(PipelineStage::Computing);
        let result = self.engine.compute(&records, metrics);
        stage(PipelineStage::Done);
        result
    }

    /// Fetch, clean, classify and filter. Empty after fetching or cleaning
    /// short-circuits with no records.
    fn collect(&self, area: &Area, profile: &FilterProfile) -> Vec<AmenityRecord> {
        stage(PipelineStage::Fetching);
        let raw = match area.bounding_box() {
            Some(bbox) => self.fetch(&bbox),
            None => Vec::new(),
        };
        if raw.is_empty() {
            debug!("no records fetched");
            return Vec::new();
        }

        stage(PipelineStage::Cleaning);
        let cleaned = self.clean(area, raw);
        if cleaned.is_empty() {
            debug!("no records inside the area");
            return Vec::new();
        }

        stage(PipelineStage::Classifying);
        let classified: Vec<AmenityRecord> = cleaned
            .into_iter()
            .map(|(raw, point)| {
                let classification = self.classifier.classify(&raw.tags);
                AmenityRecord::new(raw, point, classification)
            })
            .collect();

        stage(PipelineStage::Filtering);
        let total = classified.len();
        let kept = profile.apply(classified);
        debug!(
            level = profile.level_index(),
            kept = kept.len(),
            dropped = total - kept.len(),
            "filter applied"
        );
        kept
    }

    fn fetch(&self, bbox: &BoundingBox) -> Vec<RawRecord> {
        match self.source.fetch_amenities(bbox) {
            Ok(records) => {
                debug!(total = records.len(), by_type = ?count_by_type(&records), "records fetched");
                records
            }
            Err(e) => {
                warn!(error = %e, bbox = %bbox.to_overpass(), "fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Reduce every record to its centroid and keep those strictly inside
    fn clean(&self, area: &Area, raw: Vec<RawRecord>) -> Vec<(RawRecord, Point<f64>)> {
        let total = raw.len();
        let cleaned: Vec<_> = raw
            .into_iter()
            .filter_map(|r| {
                let point = self.builder.build_centroid(&r)?;
                area.contains_point(&point).then_some((r, point))
            })
            .collect();
        debug!(kept = cleaned.len(), dropped = total - cleaned.len(), "records cleaned");
        cleaned
    }
}

fn stage(stage: PipelineStage) {
    debug!(%stage, "pipeline stage");
}
