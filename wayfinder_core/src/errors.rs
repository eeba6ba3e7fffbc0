// wayfinder_core/src/errors.rs

use crate::types::WayId;

/// Errors raised while building map data or tracking hypotheses.
///
/// Nothing in the matching pipeline is fatal: callers log these and carry on with
/// the remaining candidates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("way {way:?} has {points} point(s); a road needs at least 2")]
    DegenerateGeometry { way: WayId, points: usize },

    #[error("coordinate ({longitude}, {latitude}) is outside WGS84 bounds")]
    InvalidCoordinate { longitude: f64, latitude: f64 },

    #[error("unknown way {0:?}")]
    UnknownWay(WayId),

    #[error("road network has no ways")]
    EmptyNetwork,
}

pub type Result<T> = std::result::Result<T, Error>;
