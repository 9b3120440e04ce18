//! # landmix core
//!
//! Core types for measuring land-use diversity from points of interest.
//!
//! This crate provides:
//! - `RawRecord` / `AmenityRecord`: raw map elements and their classified form
//! - `GeometryBuilder`: node/way/relation records to point, line or polygon
//! - `TaxonomyTable` / `TaxonomyClassifier`: two-level category resolution
//! - `FilterProfile`: the three predefined category exclusion profiles
//! - `Area` / `BoundingBox`: validated study areas
//! - `RecordSource`: the boundary to the external map-data service

pub mod area;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod record;
pub mod source;
pub mod taxonomy;

pub use area::{Area, BoundingBox};
pub use error::{Error, Result};
pub use filter::FilterProfile;
pub use geometry::GeometryBuilder;
pub use record::{AmenityRecord, CategoryLevel, ElementType, Member, RawRecord, Vertex, UNCATEGORISED};
pub use source::{RecordSource, StaticSource};
pub use taxonomy::{Classification, TaxonomyClassifier, TaxonomyRow, TaxonomyTable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::area::{Area, BoundingBox};
    pub use crate::error::{Error, Result};
    pub use crate::filter::FilterProfile;
    pub use crate::geometry::GeometryBuilder;
    pub use crate::record::{AmenityRecord, CategoryLevel, RawRecord};
    pub use crate::source::RecordSource;
    pub use crate::taxonomy::{TaxonomyClassifier, TaxonomyTable};
}
