// wayfinder_sim/src/simulation/config/mod.rs

//! Loading of scenario files and the map catalog.

mod catalog;

pub mod structs;

pub use catalog::{MapCatalog, MapFile, PoiEntry, WayEntry};
pub use structs::ScenarioConfig;
