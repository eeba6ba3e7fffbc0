// wayfinder_core/src/rulers/geodesic.rs

use super::{cheap::wrap, normalize_heading, CheapRuler, LineProjection, Ruler};
use crate::types::LngLatAlt;
use geo::LineString;

/// Radius of the spherical earth model, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Great-circle calculations on a spherical earth.
///
/// Slower than [`CheapRuler`] but valid at any latitude, so it never needs replacing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeodesicRuler;

impl Ruler for GeodesicRuler {
    fn distance(&self, a: &LngLatAlt, b: &LngLatAlt) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let d_lat = (b.latitude - a.latitude).to_radians();
        let d_lon = wrap(b.longitude - a.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
    }

    fn bearing(&self, a: &LngLatAlt, b: &LngLatAlt) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let d_lon = wrap(b.longitude - a.longitude).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        normalize_heading(y.atan2(x).to_degrees())
    }

    fn destination(&self, p: &LngLatAlt, distance: f64, bearing: f64) -> LngLatAlt {
        let delta = distance / EARTH_RADIUS_METERS;
        let theta = bearing.to_radians();
        let lat1 = p.latitude.to_radians();
        let lon1 = p.longitude.to_radians();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        LngLatAlt {
            longitude: wrap(lon2.to_degrees()),
            latitude: lat2.to_degrees(),
            altitude: p.altitude,
        }
    }

    fn point_to_segment_distance(&self, p: &LngLatAlt, a: &LngLatAlt, b: &LngLatAlt) -> f64 {
        let local = CheapRuler::new(p.latitude);
        let line = LineString::from(vec![(a.longitude, a.latitude), (b.longitude, b.latitude)]);
        match local.distance_to_line_string(p, &line) {
            Some(projection) => self.distance(p, &projection.point),
            None => self.distance(p, a),
        }
    }

    fn distance_to_line_string(
        &self,
        p: &LngLatAlt,
        line: &LineString<f64>,
    ) -> Option<LineProjection> {
        // Segment selection happens in a planar frame centred on the query point,
        // where the approximation is at its most accurate.
        let local = CheapRuler::new(p.latitude);
        let mut projection = local.distance_to_line_string(p, line)?;

        projection.distance = self.distance(p, &projection.point);
        if let Some(segment) = line.lines().nth(projection.index) {
            projection.heading = self.bearing(&segment.start.into(), &segment.end.into());
        }
        Some(projection)
    }

    fn needs_replacing(&self, _latitude: f64) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_destination_round_trip() {
        let ruler = GeodesicRuler;
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let p = LngLatAlt::new(rng.gen_range(-179.0..179.0), rng.gen_range(-80.0..80.0));
            let bearing = rng.gen_range(0.0..360.0);
            let distance = rng.gen_range(1.0..5000.0);

            let q = ruler.destination(&p, distance, bearing);
            assert_relative_eq!(ruler.distance(&p, &q), distance, max_relative = 1e-6);
            assert_abs_diff_eq!(ruler.bearing(&p, &q), bearing, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let ruler = GeodesicRuler;
        let a = LngLatAlt::new(0.0, 0.0);
        let b = LngLatAlt::new(0.0, 1.0);
        assert_relative_eq!(ruler.distance(&a, &b), EARTH_RADIUS_METERS.to_radians(), max_relative = 1e-12);
        assert_abs_diff_eq!(ruler.bearing(&a, &b), 0.0);
        assert_abs_diff_eq!(ruler.bearing(&b, &a), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_to_line_string() {
        let ruler = GeodesicRuler;
        let line = LineString::from(vec![(0.0, 0.0), (0.001, 0.0)]);
        let p = LngLatAlt::new(0.0005, 0.0001);
        let projection = ruler.distance_to_line_string(&p, &line).unwrap();
        assert_relative_eq!(projection.distance, ruler.distance(&p, &LngLatAlt::new(0.0005, 0.0)), max_relative = 1e-6);
        assert_abs_diff_eq!(projection.heading, 90.0, epsilon = 1e-9);
        assert!(!ruler.needs_replacing(89.0));
    }
}
