// wayfinder_sim/src/simulation/mod.rs

//! Everything needed to replay a walk: configuration, the synthetic walker and its
//! sensors, and the loop that feeds them to the engine.

pub mod config;
pub mod core;
pub mod runner;
pub mod sensors;
pub mod walker;
