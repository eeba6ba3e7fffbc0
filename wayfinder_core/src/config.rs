// wayfinder_core/src/config.rs

//! Tunables for every filter, grouped per component.
//!
//! `EngineConfig` is built once (usually deserialized from the `[engine]` table of a
//! scenario file) and handed to the components that need it. Missing sections and
//! fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub kalman: KalmanConfig,
    pub nearest_road: NearestRoadConfig,
    pub map_match: MapMatchConfig,
    pub callouts: CalloutConfig,
    pub fov: FovConfig,
}

// =========================================================================
// == Component Sections ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KalmanConfig {
    /// Process noise for position smoothing, in meters per second.
    pub position_sigma: f64,
    /// Process noise for compass smoothing, in degrees per second.
    pub heading_sigma: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            position_sigma: 6.0,
            heading_sigma: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NearestRoadConfig {
    pub heading_sigma: f64,
    pub search_distance: f64,
    pub max_candidates: usize,
    /// Consecutive cycles a new road must win before it replaces the held one.
    pub debounce_cycles: u32,
}

impl Default for NearestRoadConfig {
    fn default() -> Self {
        Self {
            heading_sigma: 20.0,
            search_distance: 20.0,
            max_candidates: 10,
            debounce_cycles: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapMatchConfig {
    pub search_distance: f64,
    pub max_candidates: usize,
    /// Hypotheses whose average chord, ignoring heading penalties, exceeds this are
    /// dropped.
    pub drop_score: f64,
    /// A road further than this from the fix is out of reach.
    pub discard_distance: f64,
    pub max_radius: f64,
    pub initial_radius: f64,
    /// Damping base for extrapolating from the previous match.
    pub k: f64,
    /// Below this cosine of the heading difference the road is scored as a mismatch.
    pub heading_cosine_threshold: f64,
    pub heading_penalty: f64,
    pub score_window: usize,
    /// Road switches must be within this many average fix gaps of an intersection.
    pub intersection_gap_multiplier: f64,
}

impl Default for MapMatchConfig {
    fn default() -> Self {
        Self {
            search_distance: 20.0,
            max_candidates: 4,
            drop_score: 20.0,
            discard_distance: 30.0,
            max_radius: 30.0,
            initial_radius: 2.0,
            k: 0.2,
            heading_cosine_threshold: 0.73,
            heading_penalty: 50.0,
            score_window: 4,
            intersection_gap_multiplier: 4.0,
        }
    }
}

/// Minimum time and distance between two evaluations of a callout source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    pub min_time_ms: u64,
    pub min_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalloutConfig {
    pub history_expiry_ms: u64,
    pub intersection_expiry_ms: u64,
    /// History entries further than this from the user are forgotten.
    pub trim_distance: f64,
    pub road_sense: ThrottleConfig,
    pub poi: ThrottleConfig,
    pub intersection: ThrottleConfig,
    pub max_pois: usize,
}

impl Default for CalloutConfig {
    fn default() -> Self {
        Self {
            history_expiry_ms: 60_000,
            intersection_expiry_ms: 30_000,
            trim_distance: 50.0,
            road_sense: ThrottleConfig {
                min_time_ms: 10_000,
                min_distance: 50.0,
            },
            poi: ThrottleConfig {
                min_time_ms: 5_000,
                min_distance: 5.0,
            },
            intersection: ThrottleConfig {
                min_time_ms: 5_000,
                min_distance: 5.0,
            },
            max_pois: 10,
        }
    }
}

/// How the intersection to describe is picked from the interesting ones ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionPolicy {
    /// The closest interesting intersection.
    #[default]
    Nearest,
    /// The one joining the most distinct source ways.
    MostComplex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FovConfig {
    pub distance: f64,
    pub angle: f64,
    pub policy: IntersectionPolicy,
}

impl Default for FovConfig {
    fn default() -> Self {
        Self {
            distance: 50.0,
            angle: 90.0,
            policy: IntersectionPolicy::default(),
        }
    }
}
