// wayfinder_core/src/callouts/auto_callout.rs

//! Decides what to announce unprompted as the user moves.

use super::intersections::{describe_roads, RoadsDescription};
use crate::config::{CalloutConfig, FovConfig};
use crate::filters::{CalloutHistory, LocationUpdateFilter, TrackedCallout};
use crate::mapping::{nearest_point_on_geometry, FeatureTree, MapSnapshot, PoiCategory};
use crate::messages::{Earcon, PositionedString};
use crate::rulers::{heading_offset, normalize_heading, Ruler};
use crate::user_geometry::UserGeometry;
use std::collections::HashSet;

/// Within this many degrees of the matched road the user counts as travelling along it.
const ALONG_ROAD_TOLERANCE: f64 = 1.0;
/// POIs this close to the active beacon are announced by the beacon instead.
const BEACON_EXCLUSION_DISTANCE: f64 = 1.0;

fn earcon_for(category: PoiCategory) -> Earcon {
    match category {
        PoiCategory::Information => Earcon::InformationAlert,
        PoiCategory::Safety => Earcon::SenseSafety,
        PoiCategory::Mobility => Earcon::SenseMobility,
        _ => Earcon::SensePoi,
    }
}

#[derive(Debug, Clone)]
pub struct AutoCallout {
    fov: FovConfig,
    road_sense_filter: LocationUpdateFilter,
    poi_filter: LocationUpdateFilter,
    intersection_filter: LocationUpdateFilter,
    intersection_history: CalloutHistory,
    poi_history: CalloutHistory,
    max_pois: usize,
    last_road_sense: Option<String>,
}

impl AutoCallout {
    pub fn new(config: &CalloutConfig, fov: FovConfig) -> Self {
        Self {
            fov,
            road_sense_filter: LocationUpdateFilter::from_config(&config.road_sense),
            poi_filter: LocationUpdateFilter::from_config(&config.poi),
            intersection_filter: LocationUpdateFilter::from_config(&config.intersection),
            intersection_history: CalloutHistory::with_trim_distance(
                config.intersection_expiry_ms,
                config.trim_distance,
            ),
            poi_history: CalloutHistory::with_trim_distance(config.history_expiry_ms, config.trim_distance),
            max_pois: config.max_pois,
            last_road_sense: None,
        }
    }

    pub fn reset(&mut self) {
        self.road_sense_filter.reset();
        self.poi_filter.reset();
        self.intersection_filter.reset();
        self.intersection_history.clear();
        self.poi_history.clear();
        self.last_road_sense = None;
    }

    /// The callouts due at `user`'s current position, in speaking order.
    ///
    /// In a vehicle only the road being travelled is announced; on foot the
    /// intersection ahead and nearby points of interest are.
    pub fn update(&mut self, user: &UserGeometry, map: &MapSnapshot, ruler: &dyn Ruler) -> Vec<PositionedString> {
        let road_sense = self.road_sense(user, map, ruler);
        if !road_sense.is_empty() {
            return road_sense;
        }

        let mut callouts = self.intersections(user, map, ruler);
        let pois = self.pois(user, map, ruler);
        if !pois.is_empty() {
            self.poi_filter.update(user);
            callouts.extend(pois);
        }
        callouts
    }

    fn road_sense(&mut self, user: &UserGeometry, map: &MapSnapshot, ruler: &dyn Ruler) -> Vec<PositionedString> {
        if !user.in_vehicle() || !self.road_sense_filter.should_update(user, ruler) {
            return Vec::new();
        }
        self.road_sense_filter.update(user);

        let road = user.map_matched_way.or_else(|| {
            map.roads()
                .nearest_within(&user.location, user.search_distance(), 1, ruler)
                .first()
                .map(|(way, _)| *way)
        });
        let Some(name) = road.and_then(|id| map.way(id)).map(|way| way.display_name()) else {
            return Vec::new();
        };
        if self.last_road_sense.as_deref() == Some(name.as_str()) {
            return Vec::new();
        }

        let text = format!("Traveling along {name}");
        self.last_road_sense = Some(name);
        vec![PositionedString::standard(text).with_earcon(Earcon::LocationSense)]
    }

    fn intersections(&mut self, user: &UserGeometry, map: &MapSnapshot, ruler: &dyn Ruler) -> Vec<PositionedString> {
        // Without a matched road there is no reliable direction of approach.
        if user.map_matched_way.is_none() || user.in_vehicle() {
            return Vec::new();
        }
        if !self.intersection_filter.should_update(user, ruler) {
            return Vec::new();
        }
        self.intersection_filter.update(user);
        self.intersection_history.trim(&user.location, user.timestamp_ms);

        let description = describe_roads(map, user, &self.fov, ruler);
        match description.intersection {
            Some(_) => self.describe_intersection(&description, user, map),
            None => self.describe_road_ahead(&description, user, map),
        }
    }

    fn describe_intersection(
        &mut self,
        description: &RoadsDescription,
        user: &UserGeometry,
        map: &MapSnapshot,
    ) -> Vec<PositionedString> {
        let (Some(intersection), Some(incoming)) = (
            description.intersection.and_then(|id| map.intersection(id)),
            description.incoming_heading,
        ) else {
            return Vec::new();
        };

        let tracked = TrackedCallout::new(
            intersection.name.clone(),
            intersection.location,
            true,
            false,
            user.timestamp_ms,
        );
        if !self.intersection_history.check_and_add(tracked) {
            return Vec::new();
        }

        let mut callouts = vec![PositionedString::standard("Approaching intersection").with_earcon(Earcon::Intersection)];
        for road in &description.roads {
            let text = if road.direction.is_left() {
                format!("{} goes left", road.name)
            } else if road.direction.is_right() {
                format!("{} goes right", road.name)
            } else {
                format!("{} continues ahead", road.name)
            };
            let heading = normalize_heading(incoming + road.direction.presentation_offset());
            callouts.push(PositionedString::compass(text, intersection.location, heading));
        }
        tracing::debug!(intersection = %intersection.name, roads = description.roads.len(), "intersection callout");
        callouts
    }

    fn describe_road_ahead(
        &mut self,
        description: &RoadsDescription,
        user: &UserGeometry,
        map: &MapSnapshot,
    ) -> Vec<PositionedString> {
        let (Some(way), Some(matched), Some(heading)) = (
            description.nearest_road.and_then(|id| map.way(id)),
            user.map_matched_location,
            user.snapped_heading(),
        ) else {
            return Vec::new();
        };

        // Crossing a road is not travelling along it.
        let offset = heading_offset(heading, matched.heading);
        if offset > ALONG_ROAD_TOLERANCE && offset < 180.0 - ALONG_ROAD_TOLERANCE {
            return Vec::new();
        }

        let text = format!("Ahead {}", way.display_name());
        let tracked = TrackedCallout::new(text.clone(), user.location, false, false, user.timestamp_ms);
        if !self.intersection_history.check_and_add(tracked) {
            return Vec::new();
        }
        vec![PositionedString::standard(text)]
    }

    fn pois(&mut self, user: &UserGeometry, map: &MapSnapshot, ruler: &dyn Ruler) -> Vec<PositionedString> {
        if !self.poi_filter.should_update_activity(user, ruler) {
            return Vec::new();
        }
        self.poi_history.trim(&user.location, user.timestamp_ms);

        let nearby = map
            .poi_tree()
            .nearest_within(&user.location, user.search_distance(), self.max_pois, ruler);

        let mut names = HashSet::new();
        let mut callouts = Vec::new();
        for (index, _) in nearby {
            let Some(poi) = map.pois().get(index) else {
                continue;
            };
            if let Some(beacon) = user.current_beacon {
                let near_beacon = nearest_point_on_geometry(&beacon, &poi.feature.geometry, ruler)
                    .map_or(false, |(_, distance)| distance < BEACON_EXCLUSION_DISTANCE);
                if near_beacon {
                    continue;
                }
            }

            let Some((point, distance)) = nearest_point_on_geometry(&user.location, &poi.feature.geometry, ruler)
            else {
                continue;
            };
            if distance > user.trigger_range(poi.category) {
                continue;
            }

            let tracked = TrackedCallout::new(poi.name.clone(), point, poi.is_point(), poi.generic, user.timestamp_ms);
            if self.poi_history.find(&tracked) || !names.insert(poi.name.as_str()) {
                continue;
            }

            let earcon = earcon_for(poi.category);
            let callout = if distance == 0.0 {
                PositionedString::standard(format!("At {}", poi.name))
            } else {
                PositionedString::localized(poi.name.clone(), point)
            };
            callouts.push(callout.with_earcon(earcon));
            self.poi_history.add(tracked);
        }
        if !callouts.is_empty() {
            tracing::debug!(count = callouts.len(), "poi callouts");
        }
        callouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::network::test_support::{at, named};
    use crate::mapping::{Feature, FeatureCollection, RoadNetworkBuilder};
    use crate::messages::AudioType;
    use crate::rulers::{CheapRuler, LineProjection};
    use crate::types::{FeatureId, WayId};
    use geo::{Geometry, Point};

    fn poi(id: u64, east: f64, north: f64, name: &str, category: &str) -> Feature {
        Feature::new(FeatureId(id), Geometry::Point(Point::from(at(east, north))))
            .with_property("name", name)
            .with_property("category", category)
    }

    /// Elm St runs north and meets Oak St, running east-west, at y = 30.
    fn town(pois: Vec<Feature>) -> MapSnapshot {
        let mut builder = RoadNetworkBuilder::new();
        builder
            .add_way(1, &[at(0.0, -100.0), at(0.0, 30.0), at(0.0, 200.0)], named("Elm St"))
            .unwrap();
        builder
            .add_way(2, &[at(-50.0, 30.0), at(0.0, 30.0), at(50.0, 30.0)], named("Oak St"))
            .unwrap();
        MapSnapshot::new(builder.build().unwrap(), FeatureCollection::new(pois))
    }

    fn walker(north: f64, timestamp_ms: u64) -> UserGeometry {
        let mut user = UserGeometry::new(at(0.0, north), timestamp_ms);
        user.speed = 1.4;
        user.travel_heading = Some(0.0);
        user.map_matched_way = Some(WayId(0));
        user.map_matched_location = Some(LineProjection {
            point: at(0.0, north),
            distance: 0.0,
            heading: 0.0,
            index: 0,
            position_along_line: 0.0,
        });
        user
    }

    fn texts(callouts: &[PositionedString]) -> Vec<&str> {
        callouts.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_intersection_callout_lists_joining_roads() {
        let map = town(Vec::new());
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut auto = AutoCallout::new(&CalloutConfig::default(), FovConfig::default());

        let callouts = auto.update(&walker(0.0, 1_000), &map, &ruler);
        assert_eq!(
            texts(&callouts),
            vec![
                "Approaching intersection",
                "Elm St continues ahead",
                "Oak St goes left",
                "Oak St goes right"
            ]
        );
        assert_eq!(callouts[0].earcon, Some(Earcon::Intersection));
        assert!(callouts[1..].iter().all(|c| c.audio_type == AudioType::Compass));
        assert_eq!(callouts[1].heading, Some(0.0));
        assert_eq!(callouts[2].heading, Some(270.0));

        // Throttled, then suppressed by the history.
        assert!(auto.update(&walker(2.0, 2_000), &map, &ruler).is_empty());
        assert!(auto.update(&walker(10.0, 8_000), &map, &ruler).is_empty());
    }

    #[test]
    fn test_road_ahead_without_intersection() {
        let map = town(Vec::new());
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut auto = AutoCallout::new(&CalloutConfig::default(), FovConfig::default());

        // Past the junction nothing interesting lies ahead.
        let callouts = auto.update(&walker(60.0, 1_000), &map, &ruler);
        assert_eq!(texts(&callouts), vec!["Ahead Elm St"]);
        assert_eq!(callouts[0].audio_type, AudioType::Standard);
    }

    #[test]
    fn test_poi_within_trigger_range() {
        let map = town(vec![
            poi(1, 5.0, -60.0, "Post box", "object"),
            poi(2, 15.0, -60.0, "Cafe", "place"),
            poi(3, 40.0, -60.0, "Castle", "landmark"),
            poi(4, -15.0, -60.0, "Info board", "information"),
        ]);
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut auto = AutoCallout::new(&CalloutConfig::default(), FovConfig::default());

        let mut user = walker(-60.0, 1_000);
        user.map_matched_way = None;
        let callouts = auto.update(&user, &map, &ruler);

        let mut names = texts(&callouts);
        names.sort();
        assert_eq!(names, vec!["Cafe", "Castle", "Info board", "Post box"]);
        let info = callouts.iter().find(|c| c.text == "Info board").unwrap();
        assert_eq!(info.earcon, Some(Earcon::InformationAlert));
        assert_eq!(info.audio_type, AudioType::Localized);

        // Far enough and late enough to pass the throttle, but the history remembers.
        let mut later = walker(-54.0, 7_000);
        later.map_matched_way = None;
        assert!(auto.update(&later, &map, &ruler).is_empty());
    }

    #[test]
    fn test_poi_out_of_category_range_is_skipped() {
        let map = town(vec![poi(1, 15.0, -60.0, "Bollard", "object")]);
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut auto = AutoCallout::new(&CalloutConfig::default(), FovConfig::default());

        let mut user = walker(-60.0, 1_000);
        user.map_matched_way = None;
        assert!(auto.update(&user, &map, &ruler).is_empty());
    }

    #[test]
    fn test_vehicle_announces_road_only() {
        let map = town(vec![poi(1, 5.0, -60.0, "Post box", "object")]);
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut auto = AutoCallout::new(&CalloutConfig::default(), FovConfig::default());

        let mut user = walker(-60.0, 1_000);
        user.speed = 12.0;
        let callouts = auto.update(&user, &map, &ruler);
        assert_eq!(texts(&callouts), vec!["Traveling along Elm St"]);
        assert_eq!(callouts[0].earcon, Some(Earcon::LocationSense));
    }
}
