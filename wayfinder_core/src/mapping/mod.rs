// wayfinder_core/src/mapping/mod.rs

//! Map data consumed by the filters: the road graph, points of interest and their
//! spatial indices.

pub mod feature;
pub mod feature_tree;
pub mod network;

pub use feature::{nearest_point_on_geometry, Feature, FeatureCollection, Poi, PoiCategory, Properties};
pub use feature_tree::{FeatureTree, RTreeFeatureTree};
pub use network::{Intersection, RoadNetwork, RoadNetworkBuilder, Way, WayEnd, WayType};

use crate::types::{IntersectionId, WayId};
use geo::{Coord, Geometry, Point};

/// An immutable view of the loaded map.
///
/// Built once per map load and shared by reference with every filter, so readers
/// never observe a half-rebuilt index.
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    network: RoadNetwork,
    roads: RTreeFeatureTree<WayId>,
    intersections: RTreeFeatureTree<IntersectionId>,
    pois: Vec<Poi>,
    poi_tree: RTreeFeatureTree<usize>,
}

impl MapSnapshot {
    /// Indexes `network` and the announceable features of `pois`.
    pub fn new(network: RoadNetwork, pois: FeatureCollection) -> Self {
        let roads = RTreeFeatureTree::new(
            network
                .ways()
                .iter()
                .map(|way| (way.id, Geometry::LineString(way.line.clone()))),
        );
        let intersections = RTreeFeatureTree::new(network.intersections().iter().map(|i| {
            (i.id, Geometry::Point(Point::from(Coord::from(i.location))))
        }));

        let pois: Vec<Poi> = pois
            .features
            .into_iter()
            .filter_map(|feature| {
                let id = feature.id;
                let poi = Poi::from_feature(feature);
                if poi.is_none() {
                    tracing::trace!(?id, "skipping unnamed feature");
                }
                poi
            })
            .collect();
        let poi_tree = RTreeFeatureTree::new(
            pois.iter()
                .enumerate()
                .map(|(index, poi)| (index, poi.feature.geometry.clone())),
        );

        Self {
            network,
            roads,
            intersections,
            pois,
            poi_tree,
        }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn way(&self, id: WayId) -> Option<&Way> {
        self.network.way(id)
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.network.intersection(id)
    }

    pub fn roads(&self) -> &RTreeFeatureTree<WayId> {
        &self.roads
    }

    pub fn intersections(&self) -> &RTreeFeatureTree<IntersectionId> {
        &self.intersections
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn poi_tree(&self) -> &RTreeFeatureTree<usize> {
        &self.poi_tree
    }
}
