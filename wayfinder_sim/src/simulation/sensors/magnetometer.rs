// wayfinder_sim/src/simulation/sensors/magnetometer.rs

use rand_distr::{Distribution, Normal};
use wayfinder_core::messages::HeadingFix;
use wayfinder_core::rulers::normalize_heading;

use crate::errors::Result;
use crate::simulation::config::structs::Compass;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::walker::TruePose;

/// A phone compass held facing the direction of travel.
#[derive(Debug, Clone)]
pub struct Magnetometer {
    noise_dist: Normal<f64>,
    accuracy: f64,
}

impl Magnetometer {
    pub fn new(config: &Compass) -> Result<Self> {
        Ok(Self {
            noise_dist: Normal::new(0.0, config.noise_sigma)?,
            accuracy: config.accuracy,
        })
    }

    pub fn measure(&self, truth: &TruePose, rng: &mut SimulationRng) -> HeadingFix {
        HeadingFix {
            heading: normalize_heading(truth.heading + self.noise_dist.sample(&mut rng.0)),
            accuracy: self.accuracy,
            timestamp_ms: truth.timestamp_ms,
        }
    }
}
