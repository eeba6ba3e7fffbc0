// wayfinder_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::callouts::AudioSink;
pub use crate::mapping::FeatureTree;
pub use crate::rulers::Ruler;

// --- Core Data Structures ---
pub use crate::messages::{AudioType, Earcon, HeadingFix, LocationFix, PositionedString, SensorInput};
pub use crate::types::{FeatureId, IntersectionId, LngLatAlt, TimestampMs, WayId};
pub use crate::user_geometry::UserGeometry;

// --- Map Data ---
pub use crate::mapping::{Feature, FeatureCollection, MapSnapshot, Poi, PoiCategory, RoadNetwork, RoadNetworkBuilder};

// --- Filters and the Engine ---
pub use crate::callouts::{AutoCallout, CalloutPipeline, PipelineEvent, PipelineState};
pub use crate::config::EngineConfig;
pub use crate::engine::{EngineOutput, GeoEngine};
pub use crate::errors::{Error, Result};
pub use crate::estimation::{KalmanHeadingFilter, KalmanLocationFilter};
pub use crate::filters::{CalloutHistory, LocationUpdateFilter, MapMatchFilter, MatchedLocation, NearestRoadFilter};

// --- Concrete Implementations (Export common ones for convenience) ---
pub use crate::mapping::RTreeFeatureTree;
pub use crate::rulers::{CheapRuler, GeodesicRuler};
