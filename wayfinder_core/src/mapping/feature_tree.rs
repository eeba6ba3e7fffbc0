// wayfinder_core/src/mapping/feature_tree.rs

//! Spatial indexing of map features.

use super::feature::nearest_point_on_geometry;
use crate::rulers::Ruler;
use crate::types::LngLatAlt;
use geo::{CoordsIter, Geometry, Intersects, Polygon, Triangle};
use rstar::{RTree, RTreeObject, AABB};
use std::fmt;

/// Nearest and within-region queries over a set of keyed features.
pub trait FeatureTree {
    type Key: Copy;

    /// Up to `max_count` features within `max_distance` meters of `location`, nearest
    /// first, with their distances.
    fn nearest_within(
        &self,
        location: &LngLatAlt,
        max_distance: f64,
        max_count: usize,
        ruler: &dyn Ruler,
    ) -> Vec<(Self::Key, f64)>;

    /// Every feature that touches `triangle`, in no particular order.
    fn within_triangle(&self, triangle: &Triangle<f64>) -> Vec<Self::Key>;

    /// The feature touching `triangle` that is nearest to `location`.
    fn nearest_within_triangle(
        &self,
        triangle: &Triangle<f64>,
        location: &LngLatAlt,
        ruler: &dyn Ruler,
    ) -> Option<(Self::Key, f64)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// --- R-tree backed implementation ---

#[derive(Debug, Clone)]
struct TreeEntry<K> {
    key: K,
    geometry: Geometry<f64>,
    envelope: AABB<[f64; 2]>,
}

impl<K> RTreeObject for TreeEntry<K> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(geometry: &Geometry<f64>) -> Option<AABB<[f64; 2]>> {
    let mut coords = geometry.coords_iter();
    let first = coords.next()?;
    let (min, max) = coords.fold(([first.x, first.y], [first.x, first.y]), |(min, max), c| {
        ([min[0].min(c.x), min[1].min(c.y)], [max[0].max(c.x), max[1].max(c.y)])
    });
    Some(AABB::from_corners(min, max))
}

/// Exact test of any geometry against a (triangle) polygon.
fn intersects_polygon(geometry: &Geometry<f64>, polygon: &Polygon<f64>) -> bool {
    match geometry {
        Geometry::Point(p) => polygon.intersects(p),
        Geometry::Line(l) => polygon.intersects(l),
        Geometry::LineString(ls) => polygon.intersects(ls),
        Geometry::Polygon(other) => polygon.intersects(other),
        Geometry::MultiPoint(mp) => mp.iter().any(|p| polygon.intersects(p)),
        Geometry::MultiLineString(mls) => mls.iter().any(|ls| polygon.intersects(ls)),
        Geometry::MultiPolygon(mp) => mp.iter().any(|other| polygon.intersects(other)),
        Geometry::GeometryCollection(gc) => gc.iter().any(|inner| intersects_polygon(inner, polygon)),
        Geometry::Rect(r) => polygon.intersects(&r.to_polygon()),
        Geometry::Triangle(t) => polygon.intersects(&t.to_polygon()),
    }
}

/// A [`FeatureTree`] over an `rstar` R-tree of lon/lat envelopes.
///
/// Envelopes only prune candidates; every answer is confirmed with the ruler or an
/// exact geometric test.
#[derive(Clone)]
pub struct RTreeFeatureTree<K> {
    tree: RTree<TreeEntry<K>>,
}

impl<K> fmt::Debug for RTreeFeatureTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTreeFeatureTree")
            .field("len", &self.tree.size())
            .finish()
    }
}

impl<K: Copy> RTreeFeatureTree<K> {
    /// Bulk loads the tree. Geometries without coordinates are skipped.
    pub fn new(items: impl IntoIterator<Item = (K, Geometry<f64>)>) -> Self {
        let entries: Vec<TreeEntry<K>> = items
            .into_iter()
            .filter_map(|(key, geometry)| {
                let envelope = envelope_of(&geometry)?;
                Some(TreeEntry {
                    key,
                    geometry,
                    envelope,
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn empty() -> Self {
        Self { tree: RTree::new() }
    }

    fn search_box(location: &LngLatAlt, radius: f64, ruler: &dyn Ruler) -> AABB<[f64; 2]> {
        let north = ruler.destination(location, radius, 0.0);
        let east = ruler.destination(location, radius, 90.0);
        let south = ruler.destination(location, radius, 180.0);
        let west = ruler.destination(location, radius, 270.0);
        AABB::from_corners(
            [west.longitude.min(location.longitude), south.latitude],
            [east.longitude.max(location.longitude), north.latitude],
        )
    }
}

impl<K: Copy> FeatureTree for RTreeFeatureTree<K> {
    type Key = K;

    fn nearest_within(
        &self,
        location: &LngLatAlt,
        max_distance: f64,
        max_count: usize,
        ruler: &dyn Ruler,
    ) -> Vec<(K, f64)> {
        let search = Self::search_box(location, max_distance, ruler);
        let mut found: Vec<(K, f64)> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .filter_map(|entry| {
                let (_, distance) = nearest_point_on_geometry(location, &entry.geometry, ruler)?;
                (distance <= max_distance).then_some((entry.key, distance))
            })
            .collect();

        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found.truncate(max_count);
        found
    }

    fn within_triangle(&self, triangle: &Triangle<f64>) -> Vec<K> {
        let polygon = triangle.to_polygon();
        let Some(search) = envelope_of(&Geometry::Triangle(*triangle)) else {
            return Vec::new();
        };
        self.tree
            .locate_in_envelope_intersecting(&search)
            .filter(|entry| intersects_polygon(&entry.geometry, &polygon))
            .map(|entry| entry.key)
            .collect()
    }

    fn nearest_within_triangle(
        &self,
        triangle: &Triangle<f64>,
        location: &LngLatAlt,
        ruler: &dyn Ruler,
    ) -> Option<(K, f64)> {
        let polygon = triangle.to_polygon();
        let search = envelope_of(&Geometry::Triangle(*triangle))?;
        self.tree
            .locate_in_envelope_intersecting(&search)
            .filter(|entry| intersects_polygon(&entry.geometry, &polygon))
            .filter_map(|entry| {
                nearest_point_on_geometry(location, &entry.geometry, ruler)
                    .map(|(_, distance)| (entry.key, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::network::test_support::at;
    use crate::rulers::CheapRuler;
    use approx::assert_abs_diff_eq;
    use geo::{Coord, LineString, Point};

    fn line(points: &[LngLatAlt]) -> Geometry<f64> {
        Geometry::LineString(LineString::new(points.iter().map(|p| Coord::from(*p)).collect()))
    }

    fn tree() -> RTreeFeatureTree<u32> {
        RTreeFeatureTree::new(vec![
            (0, line(&[at(-50.0, 5.0), at(50.0, 5.0)])),
            (1, line(&[at(-50.0, -12.0), at(50.0, -12.0)])),
            (2, line(&[at(-50.0, 40.0), at(50.0, 40.0)])),
            (3, Geometry::Point(Point::from(at(3.0, 0.0)))),
            (4, Geometry::MultiPoint(geo::MultiPoint::new(vec![]))),
        ])
    }

    #[test]
    fn test_nearest_within_orders_and_limits() {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let tree = tree();
        assert_eq!(tree.len(), 4);

        let found = tree.nearest_within(&at(0.0, 0.0), 20.0, 10, &ruler);
        let keys: Vec<u32> = found.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![3, 0, 1]);
        assert_abs_diff_eq!(found[1].1, 5.0, epsilon = 1e-6);

        let limited = tree.nearest_within(&at(0.0, 0.0), 20.0, 2, &ruler);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_within_triangle() {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let tree = tree();
        // Looking north, 30 m deep.
        let triangle = Triangle::new(
            at(0.0, 0.0).into(),
            at(-20.0, 30.0).into(),
            at(20.0, 30.0).into(),
        );
        let mut keys = tree.within_triangle(&triangle);
        keys.sort();
        assert_eq!(keys, vec![0]);

        let nearest = tree.nearest_within_triangle(&triangle, &at(0.0, 0.0), &ruler);
        assert_eq!(nearest.map(|(k, _)| k), Some(0));
    }
}
