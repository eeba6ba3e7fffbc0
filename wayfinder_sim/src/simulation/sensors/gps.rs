// wayfinder_sim/src/simulation/sensors/gps.rs

use rand_distr::{Distribution, Normal};
use wayfinder_core::messages::LocationFix;
use wayfinder_core::rulers::CheapRuler;

use crate::errors::Result;
use crate::simulation::config::structs::Gps;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::walker::TruePose;

/// Simulates a location provider with independent east and north Gaussian noise.
#[derive(Debug, Clone)]
pub struct GpsSensor {
    noise_dist: Normal<f64>,
    accuracy: f64,
    report_speed: bool,
}

impl GpsSensor {
    pub fn new(config: &Gps) -> Result<Self> {
        Ok(Self {
            noise_dist: Normal::new(0.0, config.noise_sigma)?,
            accuracy: config.accuracy,
            report_speed: config.report_speed,
        })
    }

    pub fn measure(&self, truth: &TruePose, speed: f64, ruler: &CheapRuler, rng: &mut SimulationRng) -> LocationFix {
        // Add Gaussian noise to simulate GPS inaccuracy.
        let dx = self.noise_dist.sample(&mut rng.0);
        let dy = self.noise_dist.sample(&mut rng.0);

        LocationFix {
            location: ruler.offset(&truth.location, dx, dy),
            accuracy: self.accuracy,
            speed: self.report_speed.then_some(speed),
            timestamp_ms: truth.timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use wayfinder_core::rulers::Ruler;
    use wayfinder_core::types::LngLatAlt;

    fn truth() -> TruePose {
        TruePose {
            location: LngLatAlt::new(-3.1883, 55.9533),
            heading: 0.0,
            distance: 0.0,
            timestamp_ms: 4_000,
        }
    }

    #[test]
    fn test_noiseless_fix_is_truth() {
        let config = Gps {
            noise_sigma: 0.0,
            accuracy: 3.0,
            report_speed: false,
        };
        let gps = GpsSensor::new(&config).unwrap();
        let ruler = CheapRuler::new(truth().location.latitude);
        let mut rng = SimulationRng(ChaCha8Rng::seed_from_u64(1));

        let fix = gps.measure(&truth(), 1.4, &ruler, &mut rng);
        assert_eq!(fix.location, truth().location);
        assert_eq!(fix.speed, None);
        assert_eq!(fix.timestamp_ms, 4_000);
        assert_abs_diff_eq!(fix.accuracy, 3.0);
    }

    #[test]
    fn test_noise_matches_sigma() {
        let gps = GpsSensor::new(&Gps::default()).unwrap();
        let ruler = CheapRuler::new(truth().location.latitude);
        let mut rng = SimulationRng(ChaCha8Rng::seed_from_u64(42));

        let n = 2_000;
        let mean_squared = (0..n)
            .map(|_| {
                let fix = gps.measure(&truth(), 1.4, &ruler, &mut rng);
                ruler.distance(&fix.location, &truth().location).powi(2)
            })
            .sum::<f64>()
            / n as f64;

        // Two independent axes of sigma 2 m.
        assert_abs_diff_eq!(mean_squared, 8.0, epsilon = 1.0);
        assert_eq!(gps.measure(&truth(), 1.4, &ruler, &mut rng).speed, Some(1.4));
    }

    #[test]
    fn test_negative_sigma_is_rejected() {
        let config = Gps {
            noise_sigma: -1.0,
            ..Gps::default()
        };
        assert!(GpsSensor::new(&config).is_err());
    }
}
