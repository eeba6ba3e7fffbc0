// wayfinder_core/src/filters/mod.rs

//! Filters that turn smoothed fixes into road-level knowledge.

use crate::mapping::MapSnapshot;
use crate::rulers::Ruler;

/// The world context a filter needs for one update.
///
/// Created by the caller for each tick and passed by shared reference, so a filter
/// never holds on to map data between updates.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub map: &'a MapSnapshot,
    /// Ruler valid around the current location.
    pub ruler: &'a dyn Ruler,
}

impl<'a> FilterContext<'a> {
    pub fn new(map: &'a MapSnapshot, ruler: &'a dyn Ruler) -> Self {
        Self { map, ruler }
    }
}

pub mod callout_history;
pub mod location_update;
pub mod map_match;
pub mod nearest_road;
pub mod road_follower;

pub use callout_history::{CalloutHistory, TrackedCallout};
pub use location_update::LocationUpdateFilter;
pub use map_match::{MapMatchFilter, MatchedLocation};
pub use nearest_road::NearestRoadFilter;
pub use road_follower::{FollowerState, FollowerUpdate, RoadFollower};
