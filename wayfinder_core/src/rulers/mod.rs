// wayfinder_core/src/rulers/mod.rs

//! Distance, bearing and projection calculators.
//!
//! Every spatial computation in the crate goes through a [`Ruler`]. Two variants are
//! provided: [`CheapRuler`], a local planar approximation bound to a reference
//! latitude, and [`GeodesicRuler`], a great-circle calculator that is valid anywhere.

use crate::types::LngLatAlt;
use dyn_clone::DynClone;
use geo::LineString;
use std::fmt::Debug;

pub mod cheap;
pub mod geodesic;

pub use cheap::CheapRuler;
pub use geodesic::GeodesicRuler;

/// The result of projecting a point onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProjection {
    /// The closest point on the line.
    pub point: LngLatAlt,
    /// Distance in meters from the query point to `point`.
    pub distance: f64,
    /// Bearing of the segment containing `point`, in degrees [0, 360).
    pub heading: f64,
    /// Index of the segment's first coordinate.
    pub index: usize,
    /// `index` plus the clamped fractional position within the segment.
    pub position_along_line: f64,
}

/// A calculator for distances and bearings on the surface of the earth.
///
/// Implementations must be cheap to clone, since hypotheses and tracked callouts keep
/// their own copy of the ruler they were created with.
pub trait Ruler: DynClone + Debug + Send + Sync {
    /// Distance in meters between two coordinates.
    fn distance(&self, a: &LngLatAlt, b: &LngLatAlt) -> f64;

    /// Bearing from `a` to `b` in degrees, normalized to [0, 360).
    fn bearing(&self, a: &LngLatAlt, b: &LngLatAlt) -> f64;

    /// The coordinate reached by travelling `distance` meters from `p` along `bearing`.
    fn destination(&self, p: &LngLatAlt, distance: f64, bearing: f64) -> LngLatAlt;

    /// Shortest distance in meters from `p` to the segment `a`-`b`.
    fn point_to_segment_distance(&self, p: &LngLatAlt, a: &LngLatAlt, b: &LngLatAlt) -> f64;

    /// Projects `p` onto `line`.
    ///
    /// Each segment's projection parameter is clamped to [0, 1] and the segment with
    /// the smallest distance wins; on a tie the lowest index is kept. Returns `None`
    /// for an empty line.
    fn distance_to_line_string(&self, p: &LngLatAlt, line: &LineString<f64>)
        -> Option<LineProjection>;

    /// Whether this ruler is too far from `latitude` to stay accurate.
    fn needs_replacing(&self, latitude: f64) -> bool;

    /// The point `distance` meters along `line`, clamped to its end points.
    fn along(&self, line: &LineString<f64>, distance: f64) -> Option<LngLatAlt> {
        let mut coords = line.coords().map(LngLatAlt::from);
        let first = coords.next()?;
        if distance <= 0.0 {
            return Some(first);
        }

        let mut sum = 0.0;
        let mut previous = first;
        for current in coords {
            let segment = self.distance(&previous, &current);
            sum += segment;
            if sum > distance {
                let overshoot = sum - distance;
                let heading = self.bearing(&previous, &current);
                return Some(self.destination(&previous, segment - overshoot, heading));
            }
            previous = current;
        }
        Some(previous)
    }

    /// Total length of `line` in meters.
    fn line_length(&self, line: &LineString<f64>) -> f64 {
        line.lines()
            .map(|segment| self.distance(&segment.start.into(), &segment.end.into()))
            .sum()
    }
}

dyn_clone::clone_trait_object!(Ruler);

// =========================================================================
// == Angle Helpers ==
// =========================================================================

/// Maps any angle in degrees onto [0, 360).
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Absolute difference between two headings, in [0, 180].
pub fn heading_offset(a: f64, b: f64) -> f64 {
    let diff = (normalize_heading(a) - normalize_heading(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Angle between two undirected lines with the given headings, in [0, 90].
///
/// A road can be travelled in either direction, so a heading and its reverse are
/// treated as the same line.
pub fn smallest_angle_between_lines(a: f64, b: f64) -> f64 {
    let diff = (normalize_heading(a) % 180.0 - normalize_heading(b) % 180.0).abs();
    if diff > 90.0 {
        180.0 - diff
    } else {
        diff
    }
}

/// Signed difference `to - from`, in (-180, 180].
pub fn signed_heading_delta(from: f64, to: f64) -> f64 {
    let delta = normalize_heading(to - from);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_heading() {
        assert_abs_diff_eq!(normalize_heading(-90.0), 270.0);
        assert_abs_diff_eq!(normalize_heading(720.0), 0.0);
        assert_abs_diff_eq!(normalize_heading(359.5), 359.5);
    }

    #[test]
    fn test_heading_offset_wraps() {
        assert_abs_diff_eq!(heading_offset(350.0, 10.0), 20.0);
        assert_abs_diff_eq!(heading_offset(90.0, 270.0), 180.0);
    }

    #[test]
    fn test_smallest_angle_between_lines_folds_reverse_direction() {
        assert_abs_diff_eq!(smallest_angle_between_lines(10.0, 190.0), 0.0);
        assert_abs_diff_eq!(smallest_angle_between_lines(0.0, 100.0), 80.0);
        assert_abs_diff_eq!(smallest_angle_between_lines(45.0, 315.0), 90.0);
    }

    #[test]
    fn test_signed_heading_delta() {
        assert_abs_diff_eq!(signed_heading_delta(350.0, 10.0), 20.0);
        assert_abs_diff_eq!(signed_heading_delta(10.0, 350.0), -20.0);
    }
}
