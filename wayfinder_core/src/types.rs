// wayfinder_core/src/types.rs

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

// --- Core Type Aliases ---
/// Milliseconds since an arbitrary epoch chosen by the caller. Zero means "never".
pub type TimestampMs = u64;

// --- Core Identifiers ---
/// Index of a way inside a `RoadNetwork` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct WayId(pub u32);

/// Index of an intersection inside a `RoadNetwork` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct IntersectionId(pub u32);

/// Stable identity of a point of interest or marker feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl WayId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl IntersectionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// --- Coordinates ---
/// A WGS84 position in degrees with an optional altitude in meters.
///
/// Distances and bearings between coordinates are only meaningful through a `Ruler`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLatAlt {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl LngLatAlt {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

impl From<Coord<f64>> for LngLatAlt {
    fn from(c: Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<&Coord<f64>> for LngLatAlt {
    fn from(c: &Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<Point<f64>> for LngLatAlt {
    fn from(p: Point<f64>) -> Self {
        Self::new(p.x(), p.y())
    }
}

impl From<LngLatAlt> for Coord<f64> {
    fn from(l: LngLatAlt) -> Self {
        Coord {
            x: l.longitude,
            y: l.latitude,
        }
    }
}

impl From<LngLatAlt> for Point<f64> {
    fn from(l: LngLatAlt) -> Self {
        Point::new(l.longitude, l.latitude)
    }
}
