// wayfinder_core/src/filters/road_follower.rs

//! A single road-tracking hypothesis.
//!
//! Each update places a search circle around the (extrapolated) fix and measures the
//! chord the road cuts through it. A road that keeps passing close to the centre of
//! a small circle produces consistently short chords; the rolling average of those
//! chords is the hypothesis' score, lower being better. A fix that moves at a steep
//! angle to the road fills its slot in the window with a fixed penalty instead.

use super::FilterContext;
use crate::config::MapMatchConfig;
use crate::errors::{Error, Result};
use crate::mapping::MapSnapshot;
use crate::rulers::{smallest_angle_between_lines, LineProjection};
use crate::types::{LngLatAlt, WayId};
use std::collections::VecDeque;

/// Below this distance the circle centre is considered to lie on the road.
const ON_ROAD_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerState {
    /// Scored and usable.
    Locked,
    /// No score history yet.
    Unlocked,
    /// The fix moved at a steep angle to the road; a penalty was recorded. The
    /// hypothesis stays alive but should not win this update.
    AngledAway,
    /// The road is out of reach. The hypothesis should be dropped.
    Distant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowerUpdate {
    /// Window average with penalties included.
    pub score: f64,
    /// Average of the measured chords alone; `None` until one has been measured.
    pub fit: Option<f64>,
    pub state: FollowerState,
}

impl FollowerUpdate {
    fn distant() -> Self {
        Self {
            score: f64::MAX,
            fit: None,
            state: FollowerState::Distant,
        }
    }

    /// Whether the road geometry itself no longer fits the fixes.
    pub fn is_collapsed(&self, drop_score: f64) -> bool {
        self.state != FollowerState::AngledAway && self.fit.is_some_and(|fit| fit > drop_score)
    }
}

#[derive(Debug, Clone)]
pub struct RoadFollower {
    id: u32,
    current_road: WayId,
    /// A road joining at a junction ahead, adopted once it becomes the nearer one.
    next_road: Option<WayId>,
    radius: f64,
    last_chord_points: Option<[LngLatAlt; 2]>,
    /// Chord lengths, `None` where a heading penalty took the slot.
    scores: VecDeque<Option<f64>>,
    window: usize,
    penalty: f64,
    average_point_gap: f64,
    nearest_point: Option<LineProjection>,
    last_matched: Option<LineProjection>,
    last_center: Option<LngLatAlt>,
    last_gps: Option<LngLatAlt>,
}

fn check_way(map: &MapSnapshot, way: WayId) -> Result<()> {
    let points = map.way(way).ok_or(Error::UnknownWay(way))?.line.0.len();
    if points < 2 {
        return Err(Error::DegenerateGeometry { way, points });
    }
    Ok(())
}

impl RoadFollower {
    /// Starts following `road`.
    ///
    /// `last_gps` is the fix preceding the first update, if known.
    pub fn new(
        id: u32,
        road: WayId,
        last_gps: Option<LngLatAlt>,
        map: &MapSnapshot,
        config: &MapMatchConfig,
    ) -> Result<Self> {
        check_way(map, road)?;
        Ok(Self {
            id,
            current_road: road,
            next_road: None,
            radius: config.initial_radius,
            last_chord_points: None,
            scores: VecDeque::with_capacity(config.score_window),
            window: config.score_window.max(1),
            penalty: config.heading_penalty,
            average_point_gap: 0.0,
            nearest_point: None,
            last_matched: None,
            last_center: None,
            last_gps,
        })
    }

    /// A copy of this hypothesis that will switch to `road` once it is the nearer of
    /// the two.
    pub fn extend_to_new_way(&self, id: u32, road: WayId, map: &MapSnapshot) -> Result<Self> {
        check_way(map, road)?;
        Ok(Self {
            id,
            next_road: Some(road),
            ..self.clone()
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn current_road(&self) -> WayId {
        self.current_road
    }

    pub fn next_road(&self) -> Option<WayId> {
        self.next_road
    }

    pub fn is_following(&self, road: WayId) -> bool {
        self.current_road == road || self.next_road == Some(road)
    }

    pub fn average_point_gap(&self) -> f64 {
        self.average_point_gap
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn last_center(&self) -> Option<LngLatAlt> {
        self.last_center
    }

    /// The raw fix projected onto the current road at the last update.
    pub fn nearest_point(&self) -> Option<LineProjection> {
        self.nearest_point
    }

    /// The point this hypothesis matched the last fix to.
    pub fn chosen(&self) -> Option<LineProjection> {
        self.last_matched.or(self.nearest_point)
    }

    fn fit(&self) -> Option<f64> {
        let (sum, count) = self
            .scores
            .iter()
            .flatten()
            .fold((0.0_f64, 0usize), |(sum, count), chord| (sum + chord, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    fn status(&self, state: FollowerState) -> FollowerUpdate {
        if self.scores.is_empty() {
            return FollowerUpdate {
                score: f64::MAX,
                fit: None,
                state: if state == FollowerState::Locked {
                    FollowerState::Unlocked
                } else {
                    state
                },
            };
        }
        let total: f64 = self.scores.iter().map(|s| s.unwrap_or(self.penalty)).sum();
        FollowerUpdate {
            score: total / self.scores.len() as f64,
            fit: self.fit(),
            state,
        }
    }

    fn push_score(&mut self, score: Option<f64>) {
        self.scores.push_back(score);
        while self.scores.len() > self.window {
            self.scores.pop_front();
        }
    }

    /// Folds in one raw fix and returns the new score.
    pub fn update(&mut self, gps: &LngLatAlt, ctx: &FilterContext, config: &MapMatchConfig) -> FollowerUpdate {
        let ruler = ctx.ruler;
        let Some(mut nearest) = ctx
            .map
            .way(self.current_road)
            .and_then(|way| ruler.distance_to_line_string(gps, &way.line))
        else {
            return FollowerUpdate::distant();
        };

        if let Some(next_road) = self.next_road {
            let next = ctx
                .map
                .way(next_road)
                .and_then(|way| ruler.distance_to_line_string(gps, &way.line));
            if let Some(next) = next.filter(|next| next.distance < nearest.distance) {
                self.next_road = Some(self.current_road);
                self.current_road = next_road;
                nearest = next;
            }
        }
        self.nearest_point = Some(nearest);

        if nearest.distance > config.discard_distance {
            return FollowerUpdate::distant();
        }

        let mut center = *gps;
        let mut matched = nearest;
        let mut angled_away = false;
        if let Some(last_gps) = self.last_gps {
            if last_gps == *gps {
                return self.status(FollowerState::Locked);
            }

            let point_gap = ruler.distance(gps, &last_gps);
            self.average_point_gap = if self.average_point_gap == 0.0 {
                point_gap
            } else {
                0.9 * self.average_point_gap + 0.1 * point_gap
            };

            if let Some(last_matched) = self.last_matched {
                let gps_heading = ruler.bearing(&last_gps, gps);
                let angle = smallest_angle_between_lines(gps_heading, nearest.heading);
                angled_away = angle.to_radians().cos() < config.heading_cosine_threshold;

                let d_min = self.last_chord_points.map_or(0.0, |[a, b]| {
                    ruler.distance(gps, &a).min(ruler.distance(gps, &b))
                });

                // Trust the previous offset less the more this gap departs from the norm.
                let mut ar = config.k.powf(point_gap / self.average_point_gap);
                if !ar.is_finite() {
                    ar = 1.0;
                }
                let c1 = ruler.bearing(&last_gps, &last_matched.point);
                let d1 = ruler.distance(&last_gps, &last_matched.point);
                center = ruler.destination(gps, d1 * ar, c1);
                if let Some(projection) = ctx
                    .map
                    .way(self.current_road)
                    .and_then(|way| ruler.distance_to_line_string(&center, &way.line))
                {
                    matched = projection;
                }
                self.radius = d_min.max(point_gap * ar);
            }
        }

        if matched.distance > self.radius {
            self.radius = 1.2 * matched.distance;
        }
        if self.radius > config.max_radius {
            return FollowerUpdate::distant();
        }

        let half_chord_squared = self.radius * self.radius - matched.distance * matched.distance;
        let chord = 2.0 * half_chord_squared.max(0.0).sqrt();
        if chord > 0.0 && chord.is_finite() {
            // A steep fix still advances the circle; only its score slot is penalised.
            self.push_score((!angled_away).then_some(chord));

            let chord_angle = (chord / (2.0 * self.radius)).min(1.0).asin().to_degrees();
            let direction = if matched.distance > ON_ROAD_EPSILON {
                ruler.bearing(&center, &matched.point)
            } else {
                matched.heading + 90.0
            };
            self.last_chord_points = Some([
                ruler.destination(&center, self.radius, direction + chord_angle),
                ruler.destination(&center, self.radius, direction - chord_angle),
            ]);
        } else {
            // No free space along the road inside the circle.
            self.scores.clear();
        }

        self.last_matched = Some(matched);
        self.last_center = Some(center);
        self.last_gps = Some(*gps);
        self.status(if angled_away {
            FollowerState::AngledAway
        } else {
            FollowerState::Locked
        })
    }
}
