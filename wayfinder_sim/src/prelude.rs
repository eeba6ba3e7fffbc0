// wayfinder_sim/src/prelude.rs

// Re-export the wayfinder_core prelude so the simulation can reach the engine, map
// types and rulers in one import.
pub use wayfinder_core::prelude::*;

// Re-export common simulation-specific types for easy access in other modules.
pub use crate::errors::{Result, SimError};
pub use crate::simulation::config::structs::*;
pub use crate::simulation::config::{MapCatalog, MapFile};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::runner::RunSummary;
