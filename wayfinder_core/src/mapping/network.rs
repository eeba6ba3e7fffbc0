// wayfinder_core/src/mapping/network.rs

//! The road and path graph, stored as two arenas addressed by `WayId` and
//! `IntersectionId`.

use super::feature::Properties;
use crate::errors::{Error, Result};
use crate::rulers::{CheapRuler, Ruler};
use crate::types::{IntersectionId, LngLatAlt, WayId};
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WayType {
    #[default]
    Regular,
    /// A short connector between two regular ways, e.g. a crossing.
    Joiner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayEnd {
    Start,
    End,
}

/// A road or path between two nodes of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: WayId,
    /// Identifiers of the source ways this segment was cut from.
    pub osm_ids: Vec<u64>,
    pub line: LineString<f64>,
    pub properties: Properties,
    /// Nodes at the start and end of the line, if other ways join there.
    pub intersections: [Option<IntersectionId>; 2],
    /// Length in meters.
    pub length: f64,
    pub way_type: WayType,
}

impl Way {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").map(String::as_str)
    }

    /// The name if there is one, otherwise a description of the way's class.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_owned();
        }
        if let Some(destination) = self.properties.get("destination") {
            return format!("path to {destination}");
        }
        match self.properties.get("highway").map(String::as_str) {
            Some("footway") | Some("path") | Some("pedestrian") => "path".to_owned(),
            Some("cycleway") => "cycle path".to_owned(),
            Some("service") => "service road".to_owned(),
            Some("steps") => "steps".to_owned(),
            Some(other) => other.replace('_', " "),
            None => "road".to_owned(),
        }
    }

    /// OSM `layer` tag; ways without one are at ground level.
    pub fn layer(&self) -> i32 {
        self.properties
            .get("layer")
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn start(&self) -> Option<LngLatAlt> {
        self.line.0.first().map(LngLatAlt::from)
    }

    pub fn end(&self) -> Option<LngLatAlt> {
        self.line.0.last().map(LngLatAlt::from)
    }

    /// Which end of this way touches `intersection`.
    pub fn end_at(&self, intersection: IntersectionId) -> Option<WayEnd> {
        if self.intersections[0] == Some(intersection) {
            Some(WayEnd::Start)
        } else if self.intersections[1] == Some(intersection) {
            Some(WayEnd::End)
        } else {
            None
        }
    }

    /// Bearing of the way as it leaves `intersection`.
    pub fn heading_from(&self, intersection: IntersectionId, ruler: &dyn Ruler) -> Option<f64> {
        let coords = &self.line.0;
        if coords.len() < 2 {
            return None;
        }
        let (from, to) = match self.end_at(intersection)? {
            WayEnd::Start => (coords[0], coords[1]),
            WayEnd::End => (coords[coords.len() - 1], coords[coords.len() - 2]),
        };
        Some(ruler.bearing(&from.into(), &to.into()))
    }

    /// Whether the two ways meet at a shared node.
    pub fn is_connected_to(&self, other: &Way) -> bool {
        self.shared_intersection(other).is_some()
    }

    pub fn shared_intersection(&self, other: &Way) -> Option<IntersectionId> {
        self.intersections
            .iter()
            .flatten()
            .find(|id| other.intersections.contains(&Some(**id)))
            .copied()
    }
}

/// A node where two or more ways meet.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub id: IntersectionId,
    pub location: LngLatAlt,
    pub name: String,
    /// Joining ways in insertion order. A way that loops back to the same node is
    /// listed once per end.
    pub members: Vec<WayId>,
}

#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    ways: Vec<Way>,
    intersections: Vec<Intersection>,
}

impl RoadNetwork {
    pub fn way(&self, id: WayId) -> Option<&Way> {
        self.ways.get(id.index())
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id.index())
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Distance from `location` to the nearest node at either end of `way`.
    pub fn nearest_intersection_distance(
        &self,
        way: WayId,
        location: &LngLatAlt,
        ruler: &dyn Ruler,
    ) -> Option<f64> {
        self.way(way)?
            .intersections
            .iter()
            .flatten()
            .filter_map(|id| self.intersection(*id))
            .map(|intersection| ruler.distance(location, &intersection.location))
            .min_by(f64::total_cmp)
    }
}

// =========================================================================
// == Network Construction ==
// =========================================================================

#[derive(Debug, Clone)]
struct PendingWay {
    osm_id: u64,
    coordinates: Vec<LngLatAlt>,
    properties: Properties,
    way_type: WayType,
}

/// Coordinates are matched on a grid of 1e-7 degrees, about a centimeter.
type NodeKey = (i64, i64);

fn node_key(c: &LngLatAlt) -> NodeKey {
    (
        (c.longitude * 1e7).round() as i64,
        (c.latitude * 1e7).round() as i64,
    )
}

/// Assembles a `RoadNetwork` from source polylines.
///
/// Every coordinate shared by two or more ways (or visited twice by one way) becomes
/// an intersection, and ways are cut at those nodes so that each resulting `Way`
/// only has intersections at its ends.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkBuilder {
    pending: Vec<PendingWay>,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_way(&mut self, osm_id: u64, coordinates: &[LngLatAlt], properties: Properties) -> Result<()> {
        self.add_way_with_type(osm_id, coordinates, properties, WayType::Regular)
    }

    pub fn add_way_with_type(
        &mut self,
        osm_id: u64,
        coordinates: &[LngLatAlt],
        properties: Properties,
        way_type: WayType,
    ) -> Result<()> {
        if coordinates.len() < 2 {
            return Err(Error::DegenerateGeometry {
                way: WayId(self.pending.len() as u32),
                points: coordinates.len(),
            });
        }
        if let Some(bad) = coordinates.iter().find(|c| !c.is_valid()) {
            return Err(Error::InvalidCoordinate {
                longitude: bad.longitude,
                latitude: bad.latitude,
            });
        }

        self.pending.push(PendingWay {
            osm_id,
            coordinates: coordinates.to_vec(),
            properties,
            way_type,
        });
        Ok(())
    }

    pub fn build(self) -> Result<RoadNetwork> {
        if self.pending.is_empty() {
            return Err(Error::EmptyNetwork);
        }

        let mut visits: HashMap<NodeKey, usize> = HashMap::new();
        for way in &self.pending {
            for c in &way.coordinates {
                *visits.entry(node_key(c)).or_default() += 1;
            }
        }

        let mut network = RoadNetwork::default();
        let mut nodes: HashMap<NodeKey, IntersectionId> = HashMap::new();

        for way in &self.pending {
            let mut segment_start = 0;
            for i in 1..way.coordinates.len() {
                let is_last = i == way.coordinates.len() - 1;
                let is_node = visits.get(&node_key(&way.coordinates[i])).copied().unwrap_or(0) > 1;
                if !is_last && !is_node {
                    continue;
                }

                let coordinates = &way.coordinates[segment_start..=i];
                let id = WayId(network.ways.len() as u32);
                let mut ends = [None, None];
                for (slot, c) in [coordinates[0], coordinates[coordinates.len() - 1]].iter().enumerate() {
                    let key = node_key(c);
                    if visits.get(&key).copied().unwrap_or(0) < 2 {
                        continue;
                    }
                    let node = *nodes.entry(key).or_insert_with(|| {
                        let node = IntersectionId(network.intersections.len() as u32);
                        network.intersections.push(Intersection {
                            id: node,
                            location: *c,
                            name: String::new(),
                            members: Vec::new(),
                        });
                        node
                    });
                    network.intersections[node.index()].members.push(id);
                    ends[slot] = Some(node);
                }

                let line = LineString::new(coordinates.iter().map(|c| Coord::from(*c)).collect());
                let ruler = CheapRuler::new(coordinates[0].latitude);
                network.ways.push(Way {
                    id,
                    osm_ids: vec![way.osm_id],
                    length: ruler.line_length(&line),
                    line,
                    properties: way.properties.clone(),
                    intersections: ends,
                    way_type: way.way_type,
                });
                segment_start = i;
            }
        }

        let names: Vec<String> = network
            .intersections
            .iter()
            .map(|intersection| intersection_name(&network, intersection))
            .collect();
        for (intersection, name) in network.intersections.iter_mut().zip(names) {
            intersection.name = name;
        }

        tracing::debug!(
            ways = network.ways.len(),
            intersections = network.intersections.len(),
            "road network built"
        );
        Ok(network)
    }
}

fn intersection_name(network: &RoadNetwork, intersection: &Intersection) -> String {
    let mut names: Vec<&str> = Vec::new();
    for name in intersection
        .members
        .iter()
        .filter_map(|id| network.way(*id))
        .filter_map(Way::name)
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(" and ")
}
