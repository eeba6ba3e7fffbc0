// wayfinder_core/src/estimation/mod.rs

//! Smoothing of noisy location and heading fixes.

pub mod kalman;

pub use kalman::{KalmanFilter, KalmanHeadingFilter, KalmanLocationFilter, MINIMUM_ACCURACY};
