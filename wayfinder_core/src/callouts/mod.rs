// wayfinder_core/src/callouts/mod.rs

//! Turning the user's surroundings into spoken callouts.

pub mod auto_callout;
pub mod directions;
pub mod intersections;
pub mod pipeline;

pub use auto_callout::AutoCallout;
pub use directions::{Direction, RelativeDirections, Segment};
pub use intersections::{describe_roads, fov_triangle, intersection_priority, is_trivial, JoiningRoad, RoadsDescription};
pub use pipeline::{AudioSink, CalloutPipeline, PipelineEvent, PipelineState};
