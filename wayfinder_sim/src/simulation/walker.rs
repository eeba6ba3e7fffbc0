// wayfinder_sim/src/simulation/walker.rs

use geo::{Coord, LineString};
use wayfinder_core::rulers::{CheapRuler, Ruler};
use wayfinder_core::types::{LngLatAlt, TimestampMs};

use crate::errors::{Result, SimError};

/// Meters sampled ahead of a pose to find its heading.
const HEADING_LOOKAHEAD: f64 = 0.5;

/// Ground truth for one instant of the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruePose {
    pub location: LngLatAlt,
    /// Direction of travel in degrees.
    pub heading: f64,
    /// Distance walked so far, in meters.
    pub distance: f64,
    pub timestamp_ms: TimestampMs,
}

/// A walker moving at constant speed along a polyline, sampled at a fixed interval.
#[derive(Debug, Clone)]
pub struct RouteWalker {
    route: LineString<f64>,
    ruler: CheapRuler,
    length: f64,
    speed: f64,
    interval_ms: u64,
}

impl RouteWalker {
    pub fn new(waypoints: &[LngLatAlt], speed: f64, interval_ms: u64) -> Result<Self> {
        let Some(first) = waypoints.first() else {
            return Err(SimError::InvalidRoute(0));
        };
        if waypoints.len() < 2 {
            return Err(SimError::InvalidRoute(waypoints.len()));
        }

        let ruler = CheapRuler::new(first.latitude);
        let route = LineString::new(waypoints.iter().map(|w| Coord::from(*w)).collect());
        let length = ruler.line_length(&route);
        Ok(Self {
            route,
            ruler,
            length,
            speed,
            interval_ms,
        })
    }

    pub fn ruler(&self) -> &CheapRuler {
        &self.ruler
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// The pose `distance` meters from the start, clamped to the route's ends.
    pub fn pose_at(&self, distance: f64, timestamp_ms: TimestampMs) -> Option<TruePose> {
        let distance = distance.clamp(0.0, self.length);
        let location = self.ruler.along(&self.route, distance)?;

        // Look a little ahead, or behind at the very end, to find the direction of travel.
        let heading = match self.ruler.along(&self.route, distance + HEADING_LOOKAHEAD) {
            Some(ahead) if self.ruler.distance(&location, &ahead) > HEADING_LOOKAHEAD / 2.0 => {
                self.ruler.bearing(&location, &ahead)
            }
            _ => {
                let behind = self.ruler.along(&self.route, distance - HEADING_LOOKAHEAD)?;
                self.ruler.bearing(&behind, &location)
            }
        };

        Some(TruePose {
            location,
            heading,
            distance,
            timestamp_ms,
        })
    }

    /// Every sample from the start to the end of the route, the end included.
    pub fn poses(&self) -> Vec<TruePose> {
        let step = self.speed * self.interval_ms as f64 / 1000.0;
        if step <= 0.0 {
            return self.pose_at(0.0, 0).into_iter().collect();
        }

        let mut poses = Vec::new();
        let mut tick: u64 = 0;
        loop {
            let distance = step * tick as f64;
            let at_end = distance >= self.length;
            if let Some(pose) = self.pose_at(distance, tick * self.interval_ms) {
                poses.push(pose);
            }
            if at_end {
                break;
            }
            tick += 1;
        }
        poses
    }
}
