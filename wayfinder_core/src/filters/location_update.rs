// wayfinder_core/src/filters/location_update.rs

use crate::config::ThrottleConfig;
use crate::rulers::Ruler;
use crate::types::{LngLatAlt, TimestampMs};
use crate::user_geometry::UserGeometry;

const IN_VEHICLE_TIME_MULTIPLIER: u64 = 4;

/// Throttles work triggered by location updates.
///
/// An update passes only once the user has moved further than the minimum distance
/// *and* more than the minimum time has elapsed since the last recorded baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdateFilter {
    min_time_ms: u64,
    min_distance: f64,
    last: Option<(LngLatAlt, TimestampMs)>,
}

impl LocationUpdateFilter {
    pub fn new(min_time_ms: u64, min_distance: f64) -> Self {
        Self {
            min_time_ms,
            min_distance,
            last: None,
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.min_time_ms, config.min_distance)
    }

    /// Records `user` as the new baseline.
    pub fn update(&mut self, user: &UserGeometry) {
        self.last = Some((user.location, user.timestamp_ms));
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn should_update(&self, user: &UserGeometry, ruler: &dyn Ruler) -> bool {
        self.passes(user, self.min_time_ms, self.min_distance, ruler)
    }

    /// Like [`should_update`](Self::should_update), but in a vehicle the time gate is
    /// stretched and the distance gate becomes the distance covered at the current
    /// speed over the minimum time.
    pub fn should_update_activity(&self, user: &UserGeometry, ruler: &dyn Ruler) -> bool {
        if !user.in_vehicle() {
            return self.should_update(user, ruler);
        }

        let min_time_ms = self.min_time_ms * IN_VEHICLE_TIME_MULTIPLIER;
        let min_distance = if user.speed > 0.0 {
            user.speed * self.min_time_ms as f64 / 1000.0
        } else {
            self.min_distance
        };
        self.passes(user, min_time_ms, min_distance, ruler)
    }

    fn passes(&self, user: &UserGeometry, min_time_ms: u64, min_distance: f64, ruler: &dyn Ruler) -> bool {
        let Some((location, timestamp_ms)) = self.last else {
            return true;
        };

        let distance = ruler.distance(&user.location, &location);
        let elapsed = user.timestamp_ms.saturating_sub(timestamp_ms);
        distance > min_distance && elapsed > min_time_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::network::test_support::at;
    use crate::rulers::CheapRuler;

    fn user(east: f64, timestamp_ms: TimestampMs) -> UserGeometry {
        UserGeometry::new(at(east, 0.0), timestamp_ms)
    }

    #[test]
    fn test_first_call_always_passes() {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let filter = LocationUpdateFilter::new(5_000, 5.0);
        assert!(filter.should_update(&user(0.0, 1), &ruler));
    }

    #[test]
    fn test_requires_both_time_and_distance() {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut filter = LocationUpdateFilter::new(5_000, 5.0);
        filter.update(&user(0.0, 10_000));

        // Far enough, too soon.
        assert!(!filter.should_update(&user(20.0, 12_000), &ruler));
        // Late enough, too close.
        assert!(!filter.should_update(&user(2.0, 20_000), &ruler));
        // Both.
        assert!(filter.should_update(&user(20.0, 20_000), &ruler));
    }

    #[test]
    fn test_in_vehicle_thresholds() {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut filter = LocationUpdateFilter::new(5_000, 5.0);
        filter.update(&user(0.0, 0));

        let mut driving = user(60.0, 15_000);
        driving.speed = 10.0;
        // 15 s is below the stretched 20 s gate.
        assert!(!filter.should_update_activity(&driving, &ruler));

        driving.timestamp_ms = 21_000;
        // 60 m exceeds 10 m/s over 5 s.
        assert!(filter.should_update_activity(&driving, &ruler));

        driving.location = at(40.0, 0.0);
        assert!(!filter.should_update_activity(&driving, &ruler));
    }
}
