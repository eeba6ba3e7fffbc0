// wayfinder_core/src/estimation/kalman.rs

use crate::rulers::{normalize_heading, signed_heading_delta};
use crate::types::{LngLatAlt, TimestampMs};
use nalgebra::{SVector, Vector1, Vector2};

/// Accuracy values are clamped to this floor so the gain never divides by zero.
pub const MINIMUM_ACCURACY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterState<const N: usize> {
    estimate: SVector<f64, N>,
    covariance: f64,
    timestamp_ms: TimestampMs,
}

/// A scalar-covariance Kalman smoother over an `N`-dimensional quantity.
///
/// The state is lazily initialised by the first measurement. Between updates the
/// covariance grows linearly with elapsed time, scaled by `sigma²`, to model the
/// decay in confidence of the previous estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanFilter<const N: usize> {
    sigma: f64,
    state: Option<FilterState<N>>,
}

impl<const N: usize> KalmanFilter<N> {
    pub fn new(sigma: f64) -> Self {
        Self { sigma, state: None }
    }

    /// Folds a new measurement into the estimate and returns the smoothed value.
    ///
    /// # Arguments
    /// * `measurement`: The raw measurement vector.
    /// * `timestamp_ms`: When the measurement was taken. Intervals that are not
    ///   positive add no process noise.
    /// * `accuracy`: One standard deviation of the measurement, floored at
    ///   [`MINIMUM_ACCURACY`].
    pub fn process(
        &mut self,
        measurement: &SVector<f64, N>,
        timestamp_ms: TimestampMs,
        accuracy: f64,
    ) -> SVector<f64, N> {
        let accuracy = accuracy.max(MINIMUM_ACCURACY);
        let measurement_variance = accuracy * accuracy;

        let sigma = self.sigma;
        let Some(state) = self.state.as_mut() else {
            self.state = Some(FilterState {
                estimate: *measurement,
                covariance: measurement_variance,
                timestamp_ms,
            });
            return *measurement;
        };

        let interval = (timestamp_ms as f64 - state.timestamp_ms as f64) / 1000.0;
        if interval > 0.0 {
            state.covariance += interval * sigma * sigma;
        }

        let gain = state.covariance / (state.covariance + measurement_variance);
        state.estimate += (measurement - state.estimate) * gain;
        state.covariance *= 1.0 - gain;
        state.timestamp_ms = timestamp_ms;

        state.estimate
    }

    /// Returns the filter to its uninitialised state.
    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn estimate(&self) -> Option<SVector<f64, N>> {
        self.state.map(|s| s.estimate)
    }

    pub fn covariance(&self) -> Option<f64> {
        self.state.map(|s| s.covariance)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn rebase(&mut self, estimate: SVector<f64, N>) {
        if let Some(state) = self.state.as_mut() {
            state.estimate = estimate;
        }
    }
}

// --- Specializations ---

/// Smooths positions. The estimate lives in degrees; `accuracy` is in meters and only
/// acts as a relative weight.
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanLocationFilter {
    inner: KalmanFilter<2>,
}

impl KalmanLocationFilter {
    pub fn new(sigma: f64) -> Self {
        Self {
            inner: KalmanFilter::new(sigma),
        }
    }

    pub fn process(&mut self, location: &LngLatAlt, timestamp_ms: TimestampMs, accuracy: f64) -> LngLatAlt {
        let filtered = self.inner.process(
            &Vector2::new(location.longitude, location.latitude),
            timestamp_ms,
            accuracy,
        );
        LngLatAlt {
            longitude: filtered.x,
            latitude: filtered.y,
            altitude: location.altitude,
        }
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }
}

/// Smooths compass headings on the circle.
///
/// Each measurement is unwrapped to lie within ±180° of the current estimate before
/// it is filtered, and the estimate is renormalised to [0, 360) afterwards, so that
/// 359° and 1° average to 0° rather than 180°.
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanHeadingFilter {
    inner: KalmanFilter<1>,
}

impl KalmanHeadingFilter {
    pub fn new(sigma: f64) -> Self {
        Self {
            inner: KalmanFilter::new(sigma),
        }
    }

    pub fn process(&mut self, heading: f64, timestamp_ms: TimestampMs, accuracy: f64) -> f64 {
        let heading = normalize_heading(heading);
        let unwrapped = match self.inner.estimate() {
            Some(estimate) => estimate.x + signed_heading_delta(estimate.x, heading),
            None => heading,
        };

        let filtered = normalize_heading(self.inner.process(&Vector1::new(unwrapped), timestamp_ms, accuracy).x);
        self.inner.rebase(Vector1::new(filtered));
        filtered
    }

    pub fn heading(&self) -> Option<f64> {
        self.inner.estimate().map(|e| e.x)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rulers::{CheapRuler, Ruler};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn test_first_measurement_is_adopted() {
        let mut filter = KalmanLocationFilter::new(3.0);
        let start = LngLatAlt::new(10.0, 20.0);
        assert_eq!(filter.process(&start, 1_000, 10.0), start);
        assert!(filter.is_initialized());
    }

    #[test]
    fn test_inaccurate_then_accurate_fixes() {
        let mut filter = KalmanLocationFilter::new(3.0);
        let ruler = CheapRuler::new(20.0);
        let start = LngLatAlt::new(10.0, 20.0);
        let end = ruler.destination(&start, 1000.0, 30.0);
        let t = 1_700_000_000_000;

        filter.process(&start, t, 10.0);

        // A very inaccurate fix barely moves the estimate.
        let filtered = filter.process(&end, t + 1000, 1000.0);
        assert_abs_diff_eq!(ruler.distance(&filtered, &end), 999.0, epsilon = 1.0);

        // Accurate fixes at the same instant pull it most of the way.
        let filtered = filter.process(&end, t + 1000, 10.0);
        assert_abs_diff_eq!(ruler.distance(&filtered, &end), 478.0, epsilon = 1.0);

        let filtered = filter.process(&end, t + 1000, 1.0);
        assert_abs_diff_eq!(ruler.distance(&filtered, &end), 9.0, epsilon = 1.0);
    }

    #[test]
    fn test_repeated_measurement_at_same_time_is_stable() {
        let mut filter = KalmanFilter::<2>::new(6.0);
        let m = Vector2::new(-3.2, 55.9);
        let first = filter.process(&m, 500, 5.0);
        for _ in 0..10 {
            let next = filter.process(&m, 500, 5.0);
            assert_eq!(next, first);
        }
        // No elapsed time means no process noise: confidence only grows.
        assert!(filter.covariance().unwrap() < 25.0);
    }

    #[test]
    fn test_accuracy_is_floored() {
        let mut filter = KalmanFilter::<1>::new(1.0);
        filter.process(&Vector1::new(0.0), 1, 0.0);
        assert_abs_diff_eq!(filter.covariance().unwrap(), MINIMUM_ACCURACY * MINIMUM_ACCURACY);
        let next = filter.process(&Vector1::new(1.0), 1, 0.0);
        assert!(next.x.is_finite());
    }

    #[test]
    fn test_converges_below_measurement_variance() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let noise = Normal::new(0.0, 5.0).unwrap();
        let mut filter = KalmanFilter::<1>::new(6.0);

        let mut raw = Vec::new();
        let mut filtered = Vec::new();
        for i in 0..2000u64 {
            let m = noise.sample(&mut rng);
            let f = filter.process(&Vector1::new(m), 1 + i * 1000, 5.0).x;
            if i >= 100 {
                raw.push(m);
                filtered.push(f);
            }
        }

        let variance = |v: &[f64]| {
            let mean = v.iter().sum::<f64>() / v.len() as f64;
            v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64
        };
        assert!(variance(&filtered) < 0.8 * variance(&raw));
    }

    #[test]
    fn test_reset_uninitialises() {
        let mut filter = KalmanHeadingFilter::new(20.0);
        filter.process(90.0, 1, 5.0);
        filter.reset();
        assert!(filter.heading().is_none());
        assert_abs_diff_eq!(filter.process(45.0, 2, 5.0), 45.0);
    }

    #[test]
    fn test_heading_filter_wraps_around_north() {
        let mut filter = KalmanHeadingFilter::new(20.0);
        filter.process(359.0, 1_000, 10.0);
        let h = filter.process(1.0, 1_000, 10.0);
        // Equal weights: halfway between, i.e. due north.
        assert!(h < 0.5 || h > 359.5, "heading was {h}");
    }
}
