// wayfinder_core/src/filters/nearest_road.rs

use super::FilterContext;
use crate::config::NearestRoadConfig;
use crate::estimation::KalmanHeadingFilter;
use crate::mapping::FeatureTree;
use crate::rulers::smallest_angle_between_lines;
use crate::types::{LngLatAlt, TimestampMs, WayId};

// Fitness weights: distance counts three times as much as heading alignment.
const DISTANCE_WEIGHT: f64 = 300.0;
const HEADING_WEIGHT: f64 = 100.0;
// Each term halves at these values.
const DISTANCE_HALF: f64 = 10.0;
const HEADING_HALF: f64 = 30.0;

/// Scores how well a road explains the user's position and heading.
pub fn road_fitness(distance: f64, heading_offset: f64) -> f64 {
    DISTANCE_WEIGHT * (DISTANCE_HALF / (DISTANCE_HALF + distance))
        + HEADING_WEIGHT * (HEADING_HALF / (HEADING_HALF + heading_offset))
}

/// Tracks the single road the user is most likely on.
///
/// A challenger must win on `debounce_cycles` consecutive updates before it
/// replaces the held road.
#[derive(Debug, Clone)]
pub struct NearestRoadFilter {
    config: NearestRoadConfig,
    heading_filter: KalmanHeadingFilter,
    road: Option<WayId>,
    debounce: u32,
}

impl NearestRoadFilter {
    pub fn new(config: NearestRoadConfig) -> Self {
        Self {
            heading_filter: KalmanHeadingFilter::new(config.heading_sigma),
            debounce: config.debounce_cycles,
            road: None,
            config,
        }
    }

    pub fn get(&self) -> Option<WayId> {
        self.road
    }

    pub fn reset(&mut self) {
        self.road = None;
        self.debounce = self.config.debounce_cycles;
        self.heading_filter.reset();
    }

    /// Folds in one fix and returns the held road.
    ///
    /// # Arguments
    /// * `bearing`: Raw travel or compass heading, if known, with its accuracy.
    ///   Without any heading every candidate gets the worst alignment score.
    pub fn update(
        &mut self,
        location: &LngLatAlt,
        bearing: Option<(f64, f64)>,
        timestamp_ms: TimestampMs,
        ctx: &FilterContext,
    ) -> Option<WayId> {
        let heading = match bearing {
            Some((heading, accuracy)) => Some(self.heading_filter.process(heading, timestamp_ms, accuracy)),
            None => self.heading_filter.heading(),
        };

        let candidates = ctx.map.roads().nearest_within(
            location,
            self.config.search_distance,
            self.config.max_candidates,
            ctx.ruler,
        );

        let mut best: Option<(WayId, f64)> = None;
        for (way_id, distance) in candidates {
            let Some(way) = ctx.map.way(way_id) else {
                continue;
            };
            let Some(projection) = ctx.ruler.distance_to_line_string(location, &way.line) else {
                continue;
            };
            let offset = heading.map_or(90.0, |h| smallest_angle_between_lines(h, projection.heading));
            let fitness = road_fitness(distance, offset);
            if best.map_or(true, |(_, f)| fitness > f) {
                best = Some((way_id, fitness));
            }
        }

        // Nothing in range: keep whatever is held.
        let Some((best, _)) = best else {
            return self.road;
        };

        match self.road {
            None => {
                self.road = Some(best);
                self.debounce = self.config.debounce_cycles;
            }
            Some(held) if held == best => {
                self.debounce = self.config.debounce_cycles;
            }
            Some(held) => {
                self.debounce = self.debounce.saturating_sub(1);
                if self.debounce == 0 {
                    tracing::debug!(from = ?held, to = ?best, "nearest road switched");
                    self.road = Some(best);
                    self.debounce = self.config.debounce_cycles;
                }
            }
        }
        self.road
    }
}
