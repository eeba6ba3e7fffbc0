// wayfinder_sim/src/simulation/sensors/mod.rs

//! Synthetic sensors that turn ground truth into noisy engine inputs, and the console
//! stand-in for the audio output.

pub mod console;
pub mod gps;
pub mod magnetometer;

pub use console::ConsoleSink;
pub use gps::GpsSensor;
pub use magnetometer::Magnetometer;
