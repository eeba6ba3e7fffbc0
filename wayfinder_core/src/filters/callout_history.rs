// wayfinder_core/src/filters/callout_history.rs

use crate::messages::PositionedString;
use crate::rulers::{CheapRuler, Ruler};
use crate::types::{LngLatAlt, TimestampMs};

/// Generic callouts closer than this are the same thing seen twice.
const GENERIC_MATCH_DISTANCE: f64 = 20.0;
/// Point callouts with equal text closer than this are the same thing.
const POINT_MATCH_DISTANCE: f64 = 10.0;
pub const DEFAULT_TRIM_DISTANCE: f64 = 50.0;

/// An announcement that has already been made.
#[derive(Debug, Clone)]
pub struct TrackedCallout {
    pub callout: String,
    pub location: LngLatAlt,
    /// The feature is a point rather than a line or area.
    pub is_point: bool,
    /// The feature is one of many alike ("bench"), matched by location only.
    pub is_generic: bool,
    pub time_ms: TimestampMs,
    ruler: CheapRuler,
}

impl TrackedCallout {
    pub fn new(
        callout: impl Into<String>,
        location: LngLatAlt,
        is_point: bool,
        is_generic: bool,
        time_ms: TimestampMs,
    ) -> Self {
        Self {
            callout: callout.into(),
            location,
            is_point,
            is_generic,
            time_ms,
            ruler: CheapRuler::new(location.latitude),
        }
    }

    /// Tracks a multi-part callout by its concatenated text.
    pub fn from_positioned(
        parts: &[PositionedString],
        location: LngLatAlt,
        is_point: bool,
        time_ms: TimestampMs,
    ) -> Self {
        let text = parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(text, location, is_point, false, time_ms)
    }

    /// Whether `other` announces the same thing as `self`.
    ///
    /// Two generic callouts match on proximity alone. Otherwise the text must be equal,
    /// and if either is a point the locations must also be close. Lines and areas
    /// are not compared by location because their nearest point moves with the user.
    pub fn matches(&self, other: &TrackedCallout) -> bool {
        if self.is_generic && other.is_generic {
            return self.ruler.distance(&self.location, &other.location) < GENERIC_MATCH_DISTANCE;
        }
        if self.callout != other.callout {
            return false;
        }
        if self.is_point || other.is_point {
            return self.ruler.distance(&self.location, &other.location) < POINT_MATCH_DISTANCE;
        }
        true
    }
}

/// Recently made callouts, forgotten with time and distance.
#[derive(Debug, Clone)]
pub struct CalloutHistory {
    expiry_ms: u64,
    trim_distance: f64,
    entries: Vec<TrackedCallout>,
}

impl CalloutHistory {
    pub fn new(expiry_ms: u64) -> Self {
        Self::with_trim_distance(expiry_ms, DEFAULT_TRIM_DISTANCE)
    }

    pub fn with_trim_distance(expiry_ms: u64, trim_distance: f64) -> Self {
        Self {
            expiry_ms,
            trim_distance,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, callout: TrackedCallout) {
        self.entries.push(callout);
    }

    /// Forgets entries older than the expiry period, or further than the trim
    /// distance from `location`. Either condition alone is enough.
    pub fn trim(&mut self, location: &LngLatAlt, now_ms: TimestampMs) {
        let expiry_ms = self.expiry_ms;
        let trim_distance = self.trim_distance;
        self.entries.retain(|entry| {
            let expired = now_ms.saturating_sub(entry.time_ms) > expiry_ms;
            let distant = entry.ruler.distance(&entry.location, location) > trim_distance;
            !(expired || distant)
        });
    }

    pub fn find(&self, callout: &TrackedCallout) -> bool {
        self.entries.iter().any(|entry| entry.matches(callout))
    }

    /// Adds `callout` unless an equivalent one is already tracked.
    ///
    /// Returns whether it was added, i.e. whether it should be announced. A match
    /// leaves the existing entry, and its timestamp, untouched.
    pub fn check_and_add(&mut self, callout: TrackedCallout) -> bool {
        if self.find(&callout) {
            tracing::trace!(text = %callout.callout, "suppressing repeated callout");
            return false;
        }
        self.add(callout);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedCallout> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::network::test_support::at;

    fn point(text: &str, east: f64, time_ms: TimestampMs) -> TrackedCallout {
        TrackedCallout::new(text, at(east, 0.0), true, false, time_ms)
    }

    #[test]
    fn test_point_equality_depends_on_distance() {
        let a = point("Cafe", 0.0, 0);
        assert!(a.matches(&point("Cafe", 5.0, 0)));
        assert!(!a.matches(&point("Cafe", 15.0, 0)));
        assert!(!a.matches(&point("Bakery", 0.0, 0)));
    }

    #[test]
    fn test_generic_and_area_equality() {
        let bench = |east| TrackedCallout::new("Bench", at(east, 0.0), true, true, 0);
        let other = TrackedCallout::new("Bin", at(15.0, 0.0), true, true, 0);
        assert!(bench(0.0).matches(&other));
        assert!(!bench(0.0).matches(&bench(25.0)));

        let park = |east| TrackedCallout::new("Park", at(east, 0.0), false, false, 0);
        assert!(park(0.0).matches(&park(40.0)));
    }

    #[test]
    fn test_trim_by_time() {
        let mut history = CalloutHistory::new(60_000);
        history.add(point("Cafe", 0.0, 0));
        history.trim(&at(0.0, 0.0), 60_000);
        assert!(history.find(&point("Cafe", 0.0, 60_000)));

        history.trim(&at(0.0, 0.0), 60_001);
        assert!(!history.find(&point("Cafe", 0.0, 60_001)));
        assert!(history.is_empty());
    }

    #[test]
    fn test_trim_by_distance() {
        let mut history = CalloutHistory::new(60_000);
        history.add(point("Cafe", 0.0, 0));
        history.add(TrackedCallout::new("Park", at(0.0, 0.0), false, false, 0));
        history.trim(&at(51.0, 0.0), 1);
        assert!(!history.find(&point("Cafe", 0.0, 1)));
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_check_and_add_does_not_refresh() {
        let mut history = CalloutHistory::new(30_000);
        assert!(history.check_and_add(point("Main St", 0.0, 0)));
        assert!(!history.check_and_add(point("Main St", 2.0, 20_000)));
        assert_eq!(history.len(), 1);

        // The original entry still expires on its own schedule.
        history.trim(&at(0.0, 0.0), 30_001);
        assert!(history.check_and_add(point("Main St", 2.0, 30_001)));
    }
}
