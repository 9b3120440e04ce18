//! Study areas and their bounding boxes

use geo::{BoundingRect, Contains};
use geo_types::{Geometry, LineString, MultiPolygon, Point, Polygon};

use crate::error::{Error, Result};

/// Axis-aligned bounding box in (lon, lat) order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Latitude/longitude order used by Overpass filters: `south,west,north,east`
    pub fn to_overpass(&self) -> String {
        format!("{},{},{},{}", self.min_y, self.min_x, self.max_y, self.max_x)
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}

/// A validated study area: a polygon or a multipolygon.
///
/// Any other geometry kind is rejected at construction with
/// [`Error::InvalidArea`].
#[derive(Debug, Clone, PartialEq)]
pub enum Area {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Area {
    pub fn from_geometry(geometry: Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Polygon(p) => Ok(Self::Polygon(p)),
            Geometry::MultiPolygon(mp) => Ok(Self::MultiPolygon(mp)),
            other => Err(Error::InvalidArea(geometry_kind(&other).to_string())),
        }
    }

    /// Bounding box of the area, `None` for an empty geometry
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let rect = match self {
            Self::Polygon(p) => p.bounding_rect(),
            Self::MultiPolygon(mp) => mp.bounding_rect(),
        }?;
        Some(BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Strict containment: points on the boundary are outside
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        match self {
            Self::Polygon(p) => p.contains(point),
            Self::MultiPolygon(mp) => mp.contains(point),
        }
    }

    /// Whether a built geometry lies entirely within the area.
    ///
    /// Multipolygon areas are tested as a whole, so a footprint may cross
    /// from one member polygon into a touching one.
    pub fn contains_geometry(&self, geometry: &Geometry<f64>) -> bool {
        match (self, geometry) {
            (Self::Polygon(area), Geometry::Point(p)) => area.contains(p),
            (Self::Polygon(area), Geometry::LineString(ls)) => area.contains(ls),
            (Self::Polygon(area), Geometry::Polygon(p)) => area.contains(p),
            (Self::MultiPolygon(mp), Geometry::Point(p)) => mp.contains(p),
            (Self::MultiPolygon(mp), Geometry::LineString(ls)) => mp.contains(ls),
            (Self::MultiPolygon(mp), Geometry::Polygon(p)) => mp.contains(p),
            _ => false,
        }
    }
}

impl TryFrom<Geometry<f64>> for Area {
    type Error = Error;

    fn try_from(geometry: Geometry<f64>) -> Result<Self> {
        Self::from_geometry(geometry)
    }
}

impl From<Polygon<f64>> for Area {
    fn from(p: Polygon<f64>) -> Self {
        Self::Polygon(p)
    }
}

impl From<MultiPolygon<f64>> for Area {
    fn from(mp: MultiPolygon<f64>) -> Self {
        Self::MultiPolygon(mp)
    }
}

/// Human-readable geometry kind, used in error messages
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        BoundingBox::new(x0, y0, x0 + size, y0 + size).to_polygon()
    }

    #[test]
    fn test_rejects_non_areal_geometry() {
        let err = Area::from_geometry(Geometry::Point(Point::new(1.0, 1.0))).unwrap_err();
        assert!(matches!(err, Error::InvalidArea(ref kind) if kind == "Point"));

        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert!(Area::try_from(line).is_err());
    }

    #[test]
    fn test_bounding_box_of_multipolygon() {
        let area = Area::from(MultiPolygon(vec![square(0.0, 0.0, 1.0), square(5.0, 2.0, 1.0)]));
        let bb = area.bounding_box().unwrap();
        assert_eq!(bb, BoundingBox::new(0.0, 0.0, 6.0, 3.0));
        assert_eq!(bb.width(), 6.0);
    }

    #[test]
    fn test_overpass_bbox_order() {
        let bb = BoundingBox::new(5.4, 51.4, 5.5, 51.5);
        assert_eq!(bb.to_overpass(), "51.4,5.4,51.5,5.5");
    }

    #[test]
    fn test_boundary_points_are_outside() {
        let area = Area::from(square(0.0, 0.0, 10.0));
        assert!(area.contains_point(&Point::new(5.0, 5.0)));
        assert!(!area.contains_point(&Point::new(0.0, 5.0)));
        assert!(!area.contains_point(&Point::new(11.0, 5.0)));
    }

    #[test]
    fn test_contains_built_geometries() {
        let area = Area::from(MultiPolygon(vec![square(0.0, 0.0, 10.0), square(20.0, 0.0, 10.0)]));
        let inner = Geometry::Polygon(square(2.0, 2.0, 1.0));
        let spanning = Geometry::LineString(LineString::from(vec![(5.0, 5.0), (25.0, 5.0)]));

        assert!(area.contains_geometry(&inner));
        assert!(!area.contains_geometry(&spanning));
    }

    #[test]
    fn test_footprint_may_cross_touching_members() {
        // Members meet only at (10, 10)
        let area = Area::from(MultiPolygon(vec![square(0.0, 0.0, 10.0), square(10.0, 10.0, 10.0)]));
        let crossing = Geometry::LineString(LineString::from(vec![(5.0, 5.0), (15.0, 15.0)]));
        let leaving = Geometry::LineString(LineString::from(vec![(5.0, 5.0), (15.0, 5.0)]));

        assert!(area.contains_geometry(&crossing));
        assert!(!area.contains_geometry(&leaving));
        assert!(!area.contains_geometry(&Geometry::Point(Point::new(10.0, 10.0))));
    }
}
