// wayfinder_core/src/rulers/cheap.rs

use super::{normalize_heading, LineProjection, Ruler};
use crate::types::LngLatAlt;
use geo::LineString;
use std::f64::consts::PI;

// WGS84 ellipsoid.
const RE: f64 = 6378.137; // equatorial radius, km
const FE: f64 = 1.0 / 298.257223563; // flattening
const E2: f64 = FE * (2.0 - FE);
const RAD: f64 = PI / 180.0;

/// Latitude drift, in degrees, after which a `CheapRuler` should be rebuilt.
pub const REPLACEMENT_LATITUDE_DRIFT: f64 = 0.01;

/// Wraps a longitude difference onto [-180, 180).
pub fn wrap(degrees: f64) -> f64 {
    if (-180.0..180.0).contains(&degrees) {
        degrees
    } else {
        (degrees + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// A planar approximation of the ellipsoid around a reference latitude.
///
/// Scale factors for one degree of longitude (`kx`) and latitude (`ky`) are computed
/// once from the curvature at the reference latitude. Results stay within a fraction
/// of a percent for distances up to a few hundred kilometers near that latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheapRuler {
    latitude: f64,
    kx: f64,
    ky: f64,
}

impl CheapRuler {
    pub fn new(latitude: f64) -> Self {
        let m = RAD * RE * 1000.0;
        let cos_lat = (latitude * RAD).cos();
        let w2 = 1.0 / (1.0 - E2 * (1.0 - cos_lat * cos_lat));
        let w = w2.sqrt();

        Self {
            latitude,
            kx: m * w * cos_lat,          // normal radius of curvature
            ky: m * w * w2 * (1.0 - E2), // meridional radius of curvature
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Moves `p` by `dx` meters east and `dy` meters north.
    pub fn offset(&self, p: &LngLatAlt, dx: f64, dy: f64) -> LngLatAlt {
        LngLatAlt {
            longitude: wrap(p.longitude + dx / self.kx),
            latitude: p.latitude + dy / self.ky,
            altitude: p.altitude,
        }
    }

    /// East/north offset in meters of `b` relative to `a`.
    pub fn delta(&self, a: &LngLatAlt, b: &LngLatAlt) -> (f64, f64) {
        (
            wrap(b.longitude - a.longitude) * self.kx,
            (b.latitude - a.latitude) * self.ky,
        )
    }

    /// Projects `p` onto the segment `a`-`b`, returning the clamped parameter and the
    /// projected point.
    fn project_onto_segment(&self, p: &LngLatAlt, a: &LngLatAlt, b: &LngLatAlt) -> (f64, LngLatAlt) {
        let (dx, dy) = self.delta(a, b);
        if dx == 0.0 && dy == 0.0 {
            return (0.0, *a);
        }

        let (px, py) = self.delta(a, p);
        let t = ((px * dx + py * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);
        if t == 0.0 {
            (t, *a)
        } else if t == 1.0 {
            (t, *b)
        } else {
            (t, self.offset(a, dx * t, dy * t))
        }
    }
}

impl Ruler for CheapRuler {
    fn distance(&self, a: &LngLatAlt, b: &LngLatAlt) -> f64 {
        let (dx, dy) = self.delta(a, b);
        (dx * dx + dy * dy).sqrt()
    }

    fn bearing(&self, a: &LngLatAlt, b: &LngLatAlt) -> f64 {
        let (dx, dy) = self.delta(a, b);
        normalize_heading(dx.atan2(dy) / RAD)
    }

    fn destination(&self, p: &LngLatAlt, distance: f64, bearing: f64) -> LngLatAlt {
        let a = bearing * RAD;
        self.offset(p, a.sin() * distance, a.cos() * distance)
    }

    fn point_to_segment_distance(&self, p: &LngLatAlt, a: &LngLatAlt, b: &LngLatAlt) -> f64 {
        let (_, nearest) = self.project_onto_segment(p, a, b);
        self.distance(p, &nearest)
    }

    fn distance_to_line_string(
        &self,
        p: &LngLatAlt,
        line: &LineString<f64>,
    ) -> Option<LineProjection> {
        let coords = &line.0;
        let first = LngLatAlt::from(coords.first()?);
        if coords.len() == 1 {
            return Some(LineProjection {
                point: first,
                distance: self.distance(p, &first),
                heading: 0.0,
                index: 0,
                position_along_line: 0.0,
            });
        }

        let mut best: Option<(f64, LineProjection)> = None;
        for (index, pair) in coords.windows(2).enumerate() {
            let start = LngLatAlt::from(pair[0]);
            let end = LngLatAlt::from(pair[1]);
            let (t, point) = self.project_onto_segment(p, &start, &end);
            let (dx, dy) = self.delta(p, &point);
            let squared = dx * dx + dy * dy;

            // Strict comparison keeps the lowest index on ties.
            if best.as_ref().map_or(true, |(min, _)| squared < *min) {
                best = Some((
                    squared,
                    LineProjection {
                        point,
                        distance: squared.sqrt(),
                        heading: self.bearing(&start, &end),
                        index,
                        position_along_line: index as f64 + t,
                    },
                ));
            }
        }
        best.map(|(_, projection)| projection)
    }

    fn needs_replacing(&self, latitude: f64) -> bool {
        (self.latitude - latitude).abs() > REPLACEMENT_LATITUDE_DRIFT
    }
}
