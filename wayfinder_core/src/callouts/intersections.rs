// wayfinder_core/src/callouts/intersections.rs

//! Describing the roads and the most interesting intersection ahead of the user.

use super::directions::{Direction, RelativeDirections};
use crate::config::{FovConfig, IntersectionPolicy};
use crate::mapping::{FeatureTree, Intersection, MapSnapshot, RoadNetwork, Way};
use crate::rulers::{normalize_heading, Ruler};
use crate::types::{IntersectionId, LngLatAlt, WayId};
use crate::user_geometry::UserGeometry;
use geo::Triangle;
use std::collections::HashSet;

/// A road leaving the described intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct JoiningRoad {
    pub way: WayId,
    pub name: String,
    /// Bearing of the road as it leaves the intersection.
    pub heading: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadsDescription {
    /// The road the user is on, which may be slightly behind them.
    pub nearest_road: Option<WayId>,
    /// The nearest road inside the field of view.
    pub nearest_road_in_fov: Option<WayId>,
    pub heading: Option<f64>,
    /// Apex of the field of view.
    pub fov_location: LngLatAlt,
    pub intersection: Option<IntersectionId>,
    /// Direction of travel on arrival at the intersection.
    pub incoming_heading: Option<f64>,
    /// Roads at the intersection other than the one arrived on.
    pub roads: Vec<JoiningRoad>,
}

/// The field-of-view triangle: apex at the user, `angle` wide, `user.fov_distance` deep.
pub fn fov_triangle(user: &UserGeometry, angle: f64, ruler: &dyn Ruler) -> Triangle<f64> {
    let heading = user.snapped_heading().unwrap_or(0.0);
    let apex = user.effective_location();
    let left = ruler.destination(&apex, user.fov_distance, heading - angle / 2.0);
    let right = ruler.destination(&apex, user.fov_distance, heading + angle / 2.0);
    Triangle::new(apex.into(), left.into(), right.into())
}

/// How worth announcing an intersection is: the number of distinct names among its
/// roads other than the current road's.
///
/// Returns -1 for intersections of two or fewer ways, which are just bends, and 0
/// when the current road is unknown.
pub fn intersection_priority(network: &RoadNetwork, intersection: &Intersection, current: Option<&Way>) -> i32 {
    let Some(current) = current else {
        return 0;
    };
    if intersection.members.len() <= 2 {
        return -1;
    }

    let mut names: HashSet<&str> = HashSet::new();
    for way in intersection.members.iter().filter_map(|id| network.way(*id)) {
        // Unnamed ways earn nothing.
        let Some(name) = way.name() else {
            continue;
        };
        if Some(name) != current.name() {
            names.insert(name);
        }
    }
    names.len() as i32
}

/// Whether the intersection adds nothing to "you are on the current road".
pub fn is_trivial(network: &RoadNetwork, intersection: &Intersection, current: Option<&Way>) -> bool {
    intersection_priority(network, intersection, current) <= 0
}

fn distinct_source_ways(network: &RoadNetwork, intersection: &Intersection) -> usize {
    intersection
        .members
        .iter()
        .filter_map(|id| network.way(*id))
        .flat_map(|way| way.osm_ids.iter().copied())
        .collect::<HashSet<u64>>()
        .len()
}

/// Picks the roads and intersection to describe from what lies in the user's field of
/// view.
pub fn describe_roads(
    map: &MapSnapshot,
    user: &UserGeometry,
    config: &FovConfig,
    ruler: &dyn Ruler,
) -> RoadsDescription {
    let triangle = fov_triangle(user, config.angle, ruler);
    let location = user.effective_location();

    let nearest_road_in_fov = map
        .roads()
        .nearest_within_triangle(&triangle, &location, ruler)
        .map(|(way, _)| way);
    let nearest_road = user.map_matched_way.or_else(|| {
        map.roads()
            .nearest_within(&location, user.fov_distance, 1, ruler)
            .first()
            .map(|(way, _)| *way)
    });

    let mut description = RoadsDescription {
        nearest_road,
        nearest_road_in_fov,
        heading: user.snapped_heading(),
        fov_location: location,
        intersection: None,
        incoming_heading: None,
        roads: Vec::new(),
    };
    if nearest_road_in_fov.is_none() {
        return description;
    }

    let network = map.network();
    let current = nearest_road.and_then(|id| map.way(id));

    let mut candidates: Vec<(&Intersection, f64)> = map
        .intersections()
        .within_triangle(&triangle)
        .into_iter()
        .filter_map(|id| map.intersection(id))
        .filter(|intersection| !is_trivial(network, intersection, current))
        .map(|intersection| (intersection, ruler.distance(&location, &intersection.location)))
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    let chosen = match config.policy {
        IntersectionPolicy::Nearest => candidates.first().map(|(intersection, _)| *intersection),
        IntersectionPolicy::MostComplex => {
            let mut best: Option<(&Intersection, usize)> = None;
            for (intersection, _) in &candidates {
                let complexity = distinct_source_ways(network, intersection);
                if best.map_or(true, |(_, c)| complexity > c) {
                    best = Some((*intersection, complexity));
                }
            }
            best.map(|(intersection, _)| intersection)
        }
    };
    let Some(intersection) = chosen else {
        return description;
    };

    let incoming_heading = current
        .and_then(|way| way.heading_from(intersection.id, ruler))
        .map(|leaving| normalize_heading(leaving + 180.0))
        .unwrap_or_else(|| ruler.bearing(&location, &intersection.location));

    let mut seen = HashSet::new();
    for way in intersection.members.iter().filter_map(|id| network.way(*id)) {
        // A loop way joins the intersection twice.
        if !seen.insert(way.id) {
            continue;
        }
        let Some(heading) = way.heading_from(intersection.id, ruler) else {
            continue;
        };
        let Some(direction) = RelativeDirections::Combined.direction_of(incoming_heading, heading) else {
            continue;
        };
        if direction == Direction::Behind {
            continue;
        }
        description.roads.push(JoiningRoad {
            way: way.id,
            name: way.display_name(),
            heading,
            direction,
        });
    }

    tracing::trace!(
        intersection = ?intersection.id,
        name = %intersection.name,
        roads = description.roads.len(),
        "described intersection"
    );
    description.intersection = Some(intersection.id);
    description.incoming_heading = Some(incoming_heading);
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::network::test_support::{at, named};
    use crate::mapping::{FeatureCollection, RoadNetworkBuilder};
    use crate::rulers::CheapRuler;
    use approx::assert_abs_diff_eq;

    /// Main St runs north through a crossroads with Cross St at y = 30 and a plain
    /// junction with a Main St spur at y = 60.
    fn town() -> MapSnapshot {
        let mut builder = RoadNetworkBuilder::new();
        builder
            .add_way(1, &[at(0.0, -100.0), at(0.0, 30.0), at(0.0, 60.0), at(0.0, 200.0)], named("Main St"))
            .unwrap();
        builder
            .add_way(2, &[at(-50.0, 30.0), at(0.0, 30.0), at(50.0, 30.0)], named("Cross St"))
            .unwrap();
        builder
            .add_way(3, &[at(0.0, 60.0), at(40.0, 60.0)], named("Main St"))
            .unwrap();
        MapSnapshot::new(builder.build().unwrap(), FeatureCollection::default())
    }

    fn walking_north(map: &MapSnapshot, north: f64) -> UserGeometry {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let mut user = UserGeometry::new(at(0.0, north), 0);
        user.phone_heading = Some(0.0);
        user.fov_distance = 100.0;
        user.map_matched_way = map
            .roads()
            .nearest_within(&user.location, 1.0, 1, &ruler)
            .first()
            .map(|(way, _)| *way);
        user
    }

    fn intersection_at(map: &MapSnapshot, north: f64) -> &Intersection {
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        map.network()
            .intersections()
            .iter()
            .find(|i| ruler.distance(&i.location, &at(0.0, north)) < 0.01)
            .unwrap()
    }

    #[test]
    fn test_same_named_junction_is_trivial() {
        let map = town();
        let main = map.network().ways().iter().find(|w| w.name() == Some("Main St"));

        let spur = intersection_at(&map, 60.0);
        assert_eq!(spur.members.len(), 3);
        assert!(is_trivial(map.network(), spur, main));

        let crossroads = intersection_at(&map, 30.0);
        assert!(!is_trivial(map.network(), crossroads, main));
        assert_eq!(intersection_priority(map.network(), crossroads, main), 1);
    }

    #[test]
    fn test_unknown_current_road_scores_zero() {
        let map = town();
        let crossroads = intersection_at(&map, 30.0);
        assert_eq!(intersection_priority(map.network(), crossroads, None), 0);
    }

    #[test]
    fn test_describes_crossroads_ahead() {
        let map = town();
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        let user = walking_north(&map, 0.0);
        let description = describe_roads(&map, &user, &FovConfig::default(), &ruler);

        let crossroads = intersection_at(&map, 30.0);
        assert_eq!(description.intersection, Some(crossroads.id));
        assert_abs_diff_eq!(description.incoming_heading.unwrap(), 0.0, epsilon = 1e-6);
        assert_eq!(description.nearest_road, user.map_matched_way);

        let mut directions: Vec<(Direction, &str)> = description
            .roads
            .iter()
            .map(|road| (road.direction, road.name.as_str()))
            .collect();
        directions.sort_by_key(|(d, _)| *d as u8);
        assert_eq!(
            directions,
            vec![
                (Direction::Left, "Cross St"),
                (Direction::Ahead, "Main St"),
                (Direction::Right, "Cross St"),
            ]
        );
    }

    #[test]
    fn test_nothing_interesting_past_the_crossroads() {
        let map = town();
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);
        // Only the same-named spur lies ahead.
        let user = walking_north(&map, 40.0);
        let description = describe_roads(&map, &user, &FovConfig::default(), &ruler);
        assert!(description.intersection.is_none());
        assert!(description.nearest_road_in_fov.is_some());
        assert!(description.roads.is_empty());
    }

    #[test]
    fn test_most_complex_policy_prefers_more_source_ways() {
        let mut builder = RoadNetworkBuilder::new();
        builder
            .add_way(1, &[at(0.0, -100.0), at(0.0, 20.0), at(0.0, 40.0), at(0.0, 100.0)], named("High St"))
            .unwrap();
        builder
            .add_way(2, &[at(-30.0, 20.0), at(0.0, 20.0)], named("Low St"))
            .unwrap();
        builder
            .add_way(3, &[at(-30.0, 40.0), at(0.0, 40.0)], named("West St"))
            .unwrap();
        builder
            .add_way(4, &[at(0.0, 40.0), at(30.0, 40.0)], named("East St"))
            .unwrap();
        let map = MapSnapshot::new(builder.build().unwrap(), FeatureCollection::default());
        let ruler = CheapRuler::new(at(0.0, 0.0).latitude);

        let mut user = UserGeometry::new(at(0.0, 0.0), 0);
        user.phone_heading = Some(0.0);
        user.fov_distance = 100.0;
        user.map_matched_way = Some(WayId(0));

        let nearest = describe_roads(&map, &user, &FovConfig::default(), &ruler);
        assert_eq!(nearest.intersection, Some(intersection_at(&map, 20.0).id));

        let config = FovConfig {
            policy: IntersectionPolicy::MostComplex,
            ..FovConfig::default()
        };
        let complex = describe_roads(&map, &user, &config, &ruler);
        assert_eq!(complex.intersection, Some(intersection_at(&map, 40.0).id));
    }
}
