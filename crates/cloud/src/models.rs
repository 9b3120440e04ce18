//! Overpass API JSON response model.

use landmix_core::RawRecord;
use serde::{Deserialize, Serialize};

/// Body of an `[out:json]` Overpass response.
///
/// Unknown fields (`osm3s` and the like) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub version: Option<f64>,
    #[serde(default)]
    pub generator: Option<String>,
    /// Set by the server when the query ran out of time or memory; the
    /// element list is then incomplete.
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub elements: Vec<RawRecord>,
}

impl OverpassResponse {
    /// Whether the server reported a partial result
    pub fn is_partial(&self) -> bool {
        self.remark.as_deref().is_some_and(|r| r.contains("error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmix_core::ElementType;

    #[test]
    fn test_parses_overpass_document() {
        let json = r#"{
            "version": 0.6,
            "generator": "Overpass API 0.7.62",
            "osm3s": {"timestamp_osm_base": "2024-05-01T00:00:00Z"},
            "elements": [
                {"type": "node", "id": 42, "lat": 52.37, "lon": 4.89,
                 "tags": {"amenity": "cafe", "name": "Koffie"}},
                {"type": "way", "id": 7,
                 "bounds": {"minlat": 52.0, "minlon": 4.0, "maxlat": 52.1, "maxlon": 4.1},
                 "nodes": [1, 2, 3, 1],
                 "geometry": [
                    {"lat": 52.0, "lon": 4.0},
                    {"lat": 52.0, "lon": 4.1},
                    {"lat": 52.1, "lon": 4.1},
                    {"lat": 52.0, "lon": 4.0}
                 ],
                 "tags": {"shop": "bakery"}}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 2);
        assert_eq!(response.elements[0].element_type, ElementType::Node);
        assert_eq!(response.elements[0].tags.get("amenity").map(String::as_str), Some("cafe"));
        assert_eq!(response.elements[1].geometry.len(), 4);
        assert!(!response.is_partial());
    }

    #[test]
    fn test_detects_partial_response() {
        let json = r#"{"elements": [], "remark": "runtime error: Query timed out in \"query\" at line 3 after 25 seconds."}"#;
        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_partial());
        assert!(response.elements.is_empty());
    }
}
