//! Record sources: the boundary to the external map-data query service

use std::collections::HashMap;

use crate::area::BoundingBox;
use crate::error::Result;
use crate::record::RawRecord;

/// Supplies raw records for a bounding box.
///
/// Implementations may block on network I/O. Callers in this workspace treat
/// any error as "no records" rather than a fatal condition.
pub trait RecordSource: Send + Sync {
    /// Points of interest (shops, amenities, leisure, stations, ...) in `bbox`
    fn fetch_amenities(&self, bbox: &BoundingBox) -> Result<Vec<RawRecord>>;

    /// Building footprints in `bbox`
    fn fetch_buildings(&self, bbox: &BoundingBox) -> Result<Vec<RawRecord>>;
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn fetch_amenities(&self, bbox: &BoundingBox) -> Result<Vec<RawRecord>> {
        (**self).fetch_amenities(bbox)
    }

    fn fetch_buildings(&self, bbox: &BoundingBox) -> Result<Vec<RawRecord>> {
        (**self).fetch_buildings(bbox)
    }
}

/// In-memory source returning a fixed record set for every query.
///
/// Useful for tests and for replaying previously downloaded responses.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    amenities: Vec<RawRecord>,
    buildings: Vec<RawRecord>,
}

impl StaticSource {
    pub fn new(amenities: Vec<RawRecord>) -> Self {
        Self {
            amenities,
            buildings: Vec::new(),
        }
    }

    pub fn with_buildings(mut self, buildings: Vec<RawRecord>) -> Self {
        self.buildings = buildings;
        self
    }

    /// Parse an Overpass JSON document (`{"elements": [...]}`)
    pub fn from_overpass_json(json: &str) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct Document {
            #[serde(default)]
            elements: Vec<RawRecord>,
        }

        let doc: Document = serde_json::from_str(json)
            .map_err(|e| crate::Error::Source(format!("parsing Overpass JSON: {e}")))?;
        Ok(Self::new(doc.elements))
    }
}

impl RecordSource for StaticSource {
    fn fetch_amenities(&self, _bbox: &BoundingBox) -> Result<Vec<RawRecord>> {
        Ok(self.amenities.clone())
    }

    fn fetch_buildings(&self, _bbox: &BoundingBox) -> Result<Vec<RawRecord>> {
        Ok(self.buildings.clone())
    }
}

/// Count records per element type, used in debug logging
pub fn count_by_type(records: &[RawRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for r in records {
        *counts.entry(r.element_type.to_string()).or_insert(0) += 1;
    }
    counts
}
