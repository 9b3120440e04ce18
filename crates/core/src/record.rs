//! Raw and classified point-of-interest records
//!
//! [`RawRecord`] mirrors one element of an Overpass JSON response
//! (`out geom`). [`AmenityRecord`] is the centroid-reduced, classified form
//! that the filter and entropy stages consume.

use std::collections::HashMap;
use std::fmt;

use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::taxonomy::Classification;

/// Category assigned when a taxonomy lookup misses.
pub const UNCATEGORISED: &str = "Uncategorised";

/// Kind of a raw map element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Node,
    Way,
    Relation,
    /// Any element kind the query service may add later
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A single vertex as delivered by the query service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub lat: f64,
    pub lon: f64,
}

impl Vertex {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }
}

/// A relation member, carrying its own vertex list when the query asked for geometry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub member_type: Option<ElementType>,
    #[serde(rename = "ref", default)]
    pub reference: u64,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Vertex>>,
}

/// An unclassified feature as returned by the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Ordered vertices of a way
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<Vertex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
}

impl RawRecord {
    fn empty(element_type: ElementType, id: u64) -> Self {
        Self {
            element_type,
            id,
            tags: HashMap::new(),
            lat: None,
            lon: None,
            geometry: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Create a node at (lon, lat)
    pub fn node(id: u64, lon: f64, lat: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Self::empty(ElementType::Node, id)
        }
    }

    /// Create a way from ordered (lon, lat) vertices
    pub fn way(id: u64, vertices: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            geometry: vertices
                .into_iter()
                .map(|(lon, lat)| Vertex::new(lon, lat))
                .collect(),
            ..Self::empty(ElementType::Way, id)
        }
    }

    /// Create a relation from its members
    pub fn relation(id: u64, members: Vec<Member>) -> Self {
        Self {
            members,
            ..Self::empty(ElementType::Relation, id)
        }
    }

    /// Builder-style tag setter
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Which level of the two-level taxonomy to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryLevel {
    L0,
    L1,
}

impl fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L0 => f.write_str("L0"),
            Self::L1 => f.write_str("L1"),
        }
    }
}

/// A point of interest reduced to its centroid and classified.
///
/// Records are built once per pipeline run and never mutated afterwards;
/// filtering only decides whether a record is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct AmenityRecord {
    pub id: u64,
    pub element_type: ElementType,
    pub geometry: Point<f64>,
    pub tags: HashMap<String, String>,
    pub primary_tag: Option<String>,
    pub secondary_tag: Option<String>,
    pub l0_category: String,
    pub l1_category: String,
}

impl AmenityRecord {
    /// Combine a centroid-reduced raw record with its classification
    pub fn new(raw: RawRecord, geometry: Point<f64>, classification: Classification) -> Self {
        Self {
            id: raw.id,
            element_type: raw.element_type,
            geometry,
            tags: raw.tags,
            primary_tag: classification.primary_tag,
            secondary_tag: classification.secondary_tag,
            l0_category: classification.l0,
            l1_category: classification.l1,
        }
    }

    /// Category at the requested taxonomy level
    pub fn category(&self, level: CategoryLevel) -> &str {
        match level {
            CategoryLevel::L0 => &self.l0_category,
            CategoryLevel::L1 => &self.l1_category,
        }
    }

    /// Whether either level failed to resolve
    pub fn is_uncategorised(&self) -> bool {
        self.l0_category == UNCATEGORISED || self.l1_category == UNCATEGORISED
    }
}
