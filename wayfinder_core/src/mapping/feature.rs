// wayfinder_core/src/mapping/feature.rs

use crate::rulers::Ruler;
use crate::types::{FeatureId, LngLatAlt};
use geo::{Contains, Geometry, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-keyed tag bag carried by every feature.
pub type Properties = BTreeMap<String, String>;

/// A single map feature with an arbitrary geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry<f64>) -> Self {
        Self {
            id,
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// =========================================================================
// == Points of Interest ==
// =========================================================================

/// Coarse category of a point of interest. Drives trigger ranges and earcons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    Object,
    Safety,
    Place,
    Information,
    Mobility,
    Landmark,
    Marker,
}

impl PoiCategory {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "object" => Some(Self::Object),
            "safety" => Some(Self::Safety),
            "place" => Some(Self::Place),
            "information" => Some(Self::Information),
            "mobility" => Some(Self::Mobility),
            "landmark" => Some(Self::Landmark),
            "marker" => Some(Self::Marker),
            _ => None,
        }
    }
}

/// A named feature that can be called out.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub feature: Feature,
    pub name: String,
    pub category: PoiCategory,
    /// Generic POIs ("bench", "bus stop") are deduplicated by location only.
    pub generic: bool,
}

impl Poi {
    /// Builds a POI from a feature's `name`, `category` and `generic` tags.
    ///
    /// Features without a name are not announceable and yield `None`. An unknown or
    /// missing category falls back to `Place`.
    pub fn from_feature(feature: Feature) -> Option<Self> {
        let name = feature.property("name")?.to_owned();
        let category = feature
            .property("category")
            .and_then(PoiCategory::parse)
            .unwrap_or(PoiCategory::Place);
        let generic = feature.property("generic") == Some("yes");
        Some(Self {
            feature,
            name,
            category,
            generic,
        })
    }

    pub fn is_point(&self) -> bool {
        matches!(self.feature.geometry, Geometry::Point(_))
    }
}

// =========================================================================
// == Geometry Queries ==
// =========================================================================

/// Nearest point of `geometry` to `location` and the distance to it in meters.
///
/// Locations inside a polygon are at distance zero. Returns `None` for geometries
/// without any coordinates.
pub fn nearest_point_on_geometry(
    location: &LngLatAlt,
    geometry: &Geometry<f64>,
    ruler: &dyn Ruler,
) -> Option<(LngLatAlt, f64)> {
    match geometry {
        Geometry::Point(p) => {
            let point = LngLatAlt::from(*p);
            Some((point, ruler.distance(location, &point)))
        }
        Geometry::Line(line) => nearest_on_line(location, &LineString::new(vec![line.start, line.end]), ruler),
        Geometry::LineString(line) => nearest_on_line(location, line, ruler),
        Geometry::Polygon(polygon) => nearest_on_polygon(location, polygon, ruler),
        Geometry::MultiPoint(points) => closest(points.iter().map(|p| {
            let point = LngLatAlt::from(*p);
            Some((point, ruler.distance(location, &point)))
        })),
        Geometry::MultiLineString(lines) => {
            closest(lines.iter().map(|line| nearest_on_line(location, line, ruler)))
        }
        Geometry::MultiPolygon(polygons) => {
            closest(polygons.iter().map(|polygon| nearest_on_polygon(location, polygon, ruler)))
        }
        Geometry::GeometryCollection(collection) => closest(
            collection
                .iter()
                .map(|inner| nearest_point_on_geometry(location, inner, ruler)),
        ),
        Geometry::Rect(rect) => nearest_on_polygon(location, &rect.to_polygon(), ruler),
        Geometry::Triangle(triangle) => nearest_on_polygon(location, &triangle.to_polygon(), ruler),
    }
}

fn nearest_on_line(
    location: &LngLatAlt,
    line: &LineString<f64>,
    ruler: &dyn Ruler,
) -> Option<(LngLatAlt, f64)> {
    ruler
        .distance_to_line_string(location, line)
        .map(|projection| (projection.point, projection.distance))
}

fn nearest_on_polygon(
    location: &LngLatAlt,
    polygon: &Polygon<f64>,
    ruler: &dyn Ruler,
) -> Option<(LngLatAlt, f64)> {
    if polygon.contains(&Point::from(*location)) {
        return Some((*location, 0.0));
    }
    closest(
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| nearest_on_line(location, ring, ruler)),
    )
}

fn closest(candidates: impl Iterator<Item = Option<(LngLatAlt, f64)>>) -> Option<(LngLatAlt, f64)> {
    candidates
        .flatten()
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rulers::CheapRuler;
    use approx::assert_abs_diff_eq;
    use geo::{polygon, MultiPoint};

    #[test]
    fn test_poi_requires_name() {
        let point = Geometry::Point(Point::new(-3.19, 55.95));
        let unnamed = Feature::new(FeatureId(1), point.clone());
        assert!(Poi::from_feature(unnamed).is_none());

        let named = Feature::new(FeatureId(2), point)
            .with_property("name", "Post box")
            .with_property("category", "object")
            .with_property("generic", "yes");
        let poi = Poi::from_feature(named).unwrap();
        assert_eq!(poi.category, PoiCategory::Object);
        assert!(poi.generic);
        assert!(poi.is_point());
    }

    #[test]
    fn test_nearest_point_inside_polygon_is_zero() {
        let ruler = CheapRuler::new(55.95);
        let square = Geometry::Polygon(polygon![
            (x: -3.20, y: 55.94),
            (x: -3.18, y: 55.94),
            (x: -3.18, y: 55.96),
            (x: -3.20, y: 55.96),
        ]);
        let inside = LngLatAlt::new(-3.19, 55.95);
        let (_, distance) = nearest_point_on_geometry(&inside, &square, &ruler).unwrap();
        assert_abs_diff_eq!(distance, 0.0);

        let outside = LngLatAlt::new(-3.17, 55.95);
        let (point, distance) = nearest_point_on_geometry(&outside, &square, &ruler).unwrap();
        assert_abs_diff_eq!(point.longitude, -3.18, epsilon = 1e-9);
        assert!(distance > 600.0 && distance < 630.0);
    }

    #[test]
    fn test_nearest_point_of_multi_point_and_empty() {
        let ruler = CheapRuler::new(0.0);
        let points = Geometry::MultiPoint(MultiPoint::from(vec![(0.001, 0.0), (0.0, 0.0005)]));
        let (point, _) = nearest_point_on_geometry(&LngLatAlt::new(0.0, 0.0), &points, &ruler).unwrap();
        assert_eq!(point, LngLatAlt::new(0.0, 0.0005));

        let empty = Geometry::MultiPoint(MultiPoint::new(vec![]));
        assert!(nearest_point_on_geometry(&LngLatAlt::new(0.0, 0.0), &empty, &ruler).is_none());
    }
}
