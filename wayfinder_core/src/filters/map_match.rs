// wayfinder_core/src/filters/map_match.rs

//! Multi-hypothesis map matching.
//!
//! Every road near the user gets a [`RoadFollower`]. Where the matched road meets a
//! new candidate at a junction, the matched follower is forked instead so the new
//! hypothesis inherits its history. Each fix updates all followers and the locked one
//! with the lowest score wins, unless switching to it would be implausible. A follower
//! whose fix just moved steeply away from its road sits the update out but survives.

use super::road_follower::{FollowerState, RoadFollower};
use super::FilterContext;
use crate::config::MapMatchConfig;
use crate::mapping::{FeatureTree, WayType};
use crate::rulers::LineProjection;
use crate::types::{IntersectionId, LngLatAlt, WayId};
use std::collections::HashSet;

/// Dead-end stubs shorter than this are not worth following.
const MIN_DEAD_END_LENGTH: f64 = 20.0;

/// The road position a fix was matched to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedLocation {
    pub location: LngLatAlt,
    pub way: WayId,
    pub projection: LineProjection,
    /// Identifies the hypothesis that produced this match.
    pub follower_id: u32,
}

// --- Follower storage ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FollowerKey {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    follower: Option<RoadFollower>,
}

/// Generational slot storage; a key to a removed follower never resolves again.
#[derive(Debug, Clone, Default)]
struct FollowerArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl FollowerArena {
    fn insert(&mut self, follower: RoadFollower) -> FollowerKey {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.follower = Some(follower);
            return FollowerKey {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            follower: Some(follower),
        });
        FollowerKey {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn remove(&mut self, key: FollowerKey) -> Option<RoadFollower> {
        let slot = self.slots.get_mut(key.index)?;
        if slot.generation != key.generation {
            return None;
        }
        let follower = slot.follower.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        Some(follower)
    }

    fn get(&self, key: FollowerKey) -> Option<&RoadFollower> {
        self.slots
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.follower.as_ref())
    }

    fn get_mut(&mut self, key: FollowerKey) -> Option<&mut RoadFollower> {
        self.slots
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.follower.as_mut())
    }

    fn iter(&self) -> impl Iterator<Item = (FollowerKey, &RoadFollower)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.follower.as_ref().map(|follower| {
                (
                    FollowerKey {
                        index,
                        generation: slot.generation,
                    },
                    follower,
                )
            })
        })
    }

    fn keys(&self) -> Vec<FollowerKey> {
        self.iter().map(|(key, _)| key).collect()
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.follower.is_some()).count()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

// --- Filter ---

#[derive(Debug, Clone)]
pub struct MapMatchFilter {
    config: MapMatchConfig,
    followers: FollowerArena,
    matched: Option<(FollowerKey, MatchedLocation)>,
    last_location: Option<LngLatAlt>,
    next_id: u32,
}

impl MapMatchFilter {
    pub fn new(config: MapMatchConfig) -> Self {
        Self {
            config,
            followers: FollowerArena::default(),
            matched: None,
            last_location: None,
            next_id: 0,
        }
    }

    pub fn matched(&self) -> Option<&MatchedLocation> {
        self.matched.as_ref().map(|(_, matched)| matched)
    }

    pub fn matched_way(&self) -> Option<WayId> {
        self.matched().map(|matched| matched.way)
    }

    pub fn hypothesis_count(&self) -> usize {
        self.followers.len()
    }

    pub fn reset(&mut self) {
        self.followers.clear();
        self.matched = None;
        self.last_location = None;
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn is_tracked(&self, road: WayId) -> bool {
        self.followers.iter().any(|(_, follower)| follower.is_following(road))
    }

    /// Folds in one raw fix and returns the matched road position, if any hypothesis
    /// is good enough.
    pub fn filter(&mut self, location: &LngLatAlt, ctx: &FilterContext) -> Option<MatchedLocation> {
        self.add_candidates(location, ctx);
        self.remove_duplicates();

        let mut best: Option<(FollowerKey, f64)> = None;
        for key in self.followers.keys() {
            let Some(follower) = self.followers.get_mut(key) else {
                continue;
            };
            let update = follower.update(location, ctx, &self.config);
            if update.state == FollowerState::Distant || update.is_collapsed(self.config.drop_score) {
                tracing::trace!(
                    follower = follower.id(),
                    way = ?follower.current_road(),
                    score = update.score,
                    state = ?update.state,
                    "dropping road hypothesis"
                );
                self.followers.remove(key);
                continue;
            }
            if update.state != FollowerState::Locked {
                continue;
            }

            let Some(follower) = self.followers.get(key) else {
                continue;
            };
            if self.switch_vetoed(follower, ctx) {
                continue;
            }
            if best.map_or(true, |(_, score)| update.score < score) {
                best = Some((key, update.score));
            }
        }

        // No eligible winner: the previous match holds while its follower survives.
        let winner_key = best.map(|(key, _)| key).or_else(|| {
            let (key, _) = self.matched.as_ref()?;
            self.followers.get(*key).map(|_| *key)
        });
        let winner = winner_key.and_then(|key| {
            let follower = self.followers.get(key)?;
            let projection = follower.chosen()?;
            Some((
                key,
                MatchedLocation {
                    location: projection.point,
                    way: follower.current_road(),
                    projection,
                    follower_id: follower.id(),
                },
            ))
        });

        if let (Some((_, new)), Some((_, old))) = (&winner, &self.matched) {
            if new.way != old.way {
                tracing::debug!(from = ?old.way, to = ?new.way, "map match switched road");
            }
        }
        self.matched = winner;
        self.last_location = Some(*location);
        self.matched().copied()
    }

    /// Starts hypotheses for nearby roads nobody is following yet.
    fn add_candidates(&mut self, location: &LngLatAlt, ctx: &FilterContext) {
        let candidates = ctx.map.roads().nearest_within(
            location,
            self.config.search_distance,
            self.config.max_candidates,
            ctx.ruler,
        );

        for (road, _) in candidates {
            if self.is_tracked(road) {
                continue;
            }
            let Some(way) = ctx.map.way(road) else {
                continue;
            };
            let dead_end = way.intersections.iter().filter(|end| end.is_some()).count() == 1;
            if dead_end && way.length < MIN_DEAD_END_LENGTH {
                continue;
            }

            let junction = self.matched.as_ref().and_then(|(key, matched)| {
                self.followers.get(*key)?;
                let matched_way = ctx.map.way(matched.way)?;
                Some((*key, matched_way.shared_intersection(way)?))
            });

            match junction {
                Some((parent, intersection)) => self.fork_at_junction(parent, intersection, ctx),
                None => {
                    let id = self.allocate_id();
                    match RoadFollower::new(id, road, self.last_location, ctx.map, &self.config) {
                        Ok(follower) => {
                            self.followers.insert(follower);
                        }
                        Err(e) => tracing::warn!(way = ?road, error = %e, "cannot follow road"),
                    }
                }
            }
        }
    }

    /// Clones the matched follower once for every untracked road leaving `intersection`.
    fn fork_at_junction(&mut self, parent: FollowerKey, intersection: IntersectionId, ctx: &FilterContext) {
        let Some(parent) = self.followers.get(parent).cloned() else {
            return;
        };
        let Some(intersection) = ctx.map.intersection(intersection) else {
            return;
        };

        for &member in &intersection.members {
            if member == parent.current_road() || self.is_tracked(member) {
                continue;
            }
            if ctx.map.way(member).map_or(true, |way| way.way_type == WayType::Joiner) {
                continue;
            }
            let id = self.allocate_id();
            match parent.extend_to_new_way(id, member, ctx.map) {
                Ok(follower) => {
                    self.followers.insert(follower);
                }
                Err(e) => tracing::warn!(way = ?member, error = %e, "cannot fork road hypothesis"),
            }
        }
    }

    fn remove_duplicates(&mut self) {
        let mut seen = HashSet::new();
        let duplicates: Vec<FollowerKey> = self
            .followers
            .iter()
            .filter(|(_, follower)| !seen.insert((follower.current_road(), follower.next_road())))
            .map(|(key, _)| key)
            .collect();
        for key in duplicates {
            self.followers.remove(key);
        }
    }

    /// Whether selecting `follower` would be an implausible jump from the current
    /// match: onto a different layer without a connection, or between two roads
    /// while far from any junction on either. A road with no junction at all gives
    /// no evidence either way.
    fn switch_vetoed(&self, follower: &RoadFollower, ctx: &FilterContext) -> bool {
        let Some((_, previous)) = &self.matched else {
            return false;
        };
        let road = follower.current_road();
        if previous.way == road {
            return false;
        }
        let (Some(previous_way), Some(way)) = (ctx.map.way(previous.way), ctx.map.way(road)) else {
            return false;
        };
        if previous_way.layer() != way.layer() && !previous_way.is_connected_to(way) {
            return true;
        }

        let Some(chosen) = follower.chosen() else {
            return true;
        };
        let network = ctx.map.network();
        let from_previous = network.nearest_intersection_distance(previous.way, &previous.location, ctx.ruler);
        let from_candidate = network.nearest_intersection_distance(road, &chosen.point, ctx.ruler);
        match (from_previous, from_candidate) {
            (Some(a), Some(b)) => a + b > self.config.intersection_gap_multiplier * follower.average_point_gap(),
            _ => false,
        }
    }
}
