// wayfinder_core/src/user_geometry.rs

use crate::mapping::PoiCategory;
use crate::rulers::{heading_offset, normalize_heading, LineProjection};
use crate::types::{LngLatAlt, TimestampMs, WayId};
use serde::{Deserialize, Serialize};

/// Travelling faster than this, in m/s, is treated as being in a vehicle.
pub const IN_VEHICLE_SPEED: f64 = 5.0;
const VEHICLE_RANGE_MULTIPLIER: f64 = 6.0;
/// Below this speed, in m/s, the course over ground is noise.
const MIN_TRAVEL_SPEED: f64 = 0.2;
/// Headings within this many degrees of the matched road snap onto it.
const SNAP_TOLERANCE: f64 = 30.0;

/// Which source of heading is preferred when deciding what is "ahead".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingMode {
    /// Direction of travel when moving, otherwise where the phone points.
    #[default]
    CourseAuto,
    Phone,
    Travel,
}

/// Location and motion of the user at one instant, as seen by the callout logic.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGeometry {
    pub location: LngLatAlt,
    pub phone_heading: Option<f64>,
    pub travel_heading: Option<f64>,
    pub fov_distance: f64,
    /// Ground speed in m/s.
    pub speed: f64,
    pub timestamp_ms: TimestampMs,
    pub map_matched_way: Option<WayId>,
    pub map_matched_location: Option<LineProjection>,
    pub current_beacon: Option<LngLatAlt>,
    pub heading_mode: HeadingMode,
}

impl UserGeometry {
    pub fn new(location: LngLatAlt, timestamp_ms: TimestampMs) -> Self {
        Self {
            location,
            phone_heading: None,
            travel_heading: None,
            fov_distance: 50.0,
            speed: 0.0,
            timestamp_ms,
            map_matched_way: None,
            map_matched_location: None,
            current_beacon: None,
            heading_mode: HeadingMode::default(),
        }
    }

    pub fn in_vehicle(&self) -> bool {
        self.speed > IN_VEHICLE_SPEED
    }

    fn scale_range(&self, distance: f64) -> f64 {
        if self.in_vehicle() {
            distance * VEHICLE_RANGE_MULTIPLIER
        } else {
            distance
        }
    }

    /// Course over ground, if the user is moving fast enough for it to mean anything.
    pub fn moving_heading(&self) -> Option<f64> {
        if self.speed > MIN_TRAVEL_SPEED {
            self.travel_heading
        } else {
            None
        }
    }

    pub fn heading(&self) -> Option<f64> {
        match self.heading_mode {
            HeadingMode::CourseAuto => self.moving_heading().or(self.phone_heading),
            HeadingMode::Phone => self.phone_heading,
            HeadingMode::Travel => self.travel_heading,
        }
    }

    /// [`heading`](Self::heading), snapped to the matched road when it is close to
    /// either direction along it.
    pub fn snapped_heading(&self) -> Option<f64> {
        let heading = self.heading()?;
        let Some(road) = self.map_matched_location.map(|m| m.heading) else {
            return Some(heading);
        };

        let offset = heading_offset(heading, road);
        Some(if offset < SNAP_TOLERANCE {
            road
        } else if offset > 180.0 - SNAP_TOLERANCE {
            normalize_heading(road + 180.0)
        } else {
            heading
        })
    }

    /// Where the user is taken to be: the matched point if there is one.
    pub fn effective_location(&self) -> LngLatAlt {
        self.map_matched_location
            .map(|m| m.point)
            .unwrap_or(self.location)
    }

    /// Radius for gathering nearby POIs.
    pub fn search_distance(&self) -> f64 {
        self.scale_range(self.fov_distance)
    }

    /// Distance at which a POI of `category` is called out.
    pub fn trigger_range(&self, category: PoiCategory) -> f64 {
        self.scale_range(match category {
            PoiCategory::Object | PoiCategory::Safety => 10.0,
            PoiCategory::Place | PoiCategory::Information | PoiCategory::Mobility => 20.0,
            PoiCategory::Landmark | PoiCategory::Marker => 50.0,
        })
    }
}
