// wayfinder_core/src/lib.rs

pub mod callouts;
pub mod config;
pub mod engine;
pub mod errors;
pub mod estimation;
pub mod filters;
pub mod mapping;
pub mod messages;
pub mod prelude;
pub mod rulers;
pub mod types;
pub mod user_geometry;
