//! Geometry construction from raw records
//!
//! - **node**: point at (lon, lat)
//! - **way**: polygon when the vertex ring is closed, line otherwise
//! - **relation**: the way rule applied to the first member's vertices

use geo::Centroid;
use geo_types::{Coord, Geometry, LineString, Point, Polygon};

use crate::record::{ElementType, RawRecord, Vertex};

/// Stateless builder turning raw records into geometries.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryBuilder;

impl GeometryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the geometry of a raw record.
    ///
    /// Returns `None` when the record carries no usable geometry: a node
    /// without coordinates, an empty vertex list, or a relation whose first
    /// member has no geometry.
    pub fn build(&self, record: &RawRecord) -> Option<Geometry<f64>> {
        match record.element_type {
            ElementType::Node => match (record.lon, record.lat) {
                (Some(lon), Some(lat)) => Some(Geometry::Point(Point::new(lon, lat))),
                _ => None,
            },
            ElementType::Way => from_vertices(&record.geometry),
            ElementType::Relation => {
                let vertices = record.members.first()?.geometry.as_ref()?;
                from_vertices(vertices)
            }
            ElementType::Unknown => None,
        }
    }

    /// Build the geometry and reduce it to its centroid
    pub fn build_centroid(&self, record: &RawRecord) -> Option<Point<f64>> {
        self.build(record).as_ref().and_then(centroid)
    }
}

/// Apply the closure rule to an ordered vertex list.
///
/// A closed ring needs at least four vertices to form a polygon; shorter
/// closed lists are kept as lines.
fn from_vertices(vertices: &[Vertex]) -> Option<Geometry<f64>> {
    let coords: Vec<Coord<f64>> = vertices
        .iter()
        .map(|v| Coord { x: v.lon, y: v.lat })
        .collect();

    match coords.as_slice() {
        [] => None,
        [single] => Some(Geometry::Point(Point::from(*single))),
        [first, .., last] if first == last && coords.len() >= 4 => Some(Geometry::Polygon(
            Polygon::new(LineString::from(coords), vec![]),
        )),
        _ => Some(Geometry::LineString(LineString::from(coords))),
    }
}

/// Compute the centroid of a geometry
pub fn centroid(geom: &Geometry<f64>) -> Option<Point<f64>> {
    match geom {
        Geometry::Point(p) => Some(*p),
        Geometry::Line(l) => Some(l.centroid()),
        Geometry::LineString(ls) => ls.centroid(),
        Geometry::Polygon(p) => p.centroid(),
        Geometry::MultiPoint(mp) => mp.centroid(),
        Geometry::MultiLineString(mls) => mls.centroid(),
        Geometry::MultiPolygon(mp) => mp.centroid(),
        Geometry::Rect(r) => Some(r.centroid()),
        Geometry::Triangle(t) => Some(t.centroid()),
        Geometry::GeometryCollection(gc) => gc.centroid(),
    }
}
