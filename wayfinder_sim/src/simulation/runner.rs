// wayfinder_sim/src/simulation/runner.rs

use wayfinder_core::callouts::{AudioSink, PipelineState};
use wayfinder_core::engine::GeoEngine;
use wayfinder_core::mapping::MapSnapshot;
use wayfinder_core::messages::SensorInput;
use wayfinder_core::rulers::Ruler;

use crate::errors::Result;
use crate::simulation::config::ScenarioConfig;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::sensors::{GpsSensor, Magnetometer};
use crate::simulation::walker::RouteWalker;

/// What a replay produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub fixes: usize,
    /// Fixes for which the engine reported a map-matched location.
    pub matched: usize,
    /// Mean distance between the matched location and the true position, in meters.
    pub mean_error: f64,
    pub max_error: f64,
    pub callouts: usize,
    pub batches: usize,
}

impl RunSummary {
    pub fn matched_ratio(&self) -> f64 {
        if self.fixes == 0 {
            0.0
        } else {
            self.matched as f64 / self.fixes as f64
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "Run complete: {} fixes, {:.0}% matched, mean error {:.1} m (max {:.1} m), {} callouts in {} batches",
            self.fixes,
            100.0 * self.matched_ratio(),
            self.mean_error,
            self.max_error,
            self.callouts,
            self.batches
        );
    }
}

/// Walks the scenario route once, feeding compass and GPS fixes into a fresh engine.
///
/// Audio is acknowledged one tick after it starts, as if every batch took a
/// fix interval to speak.
pub fn run_scenario(
    scenario: &ScenarioConfig,
    map: &MapSnapshot,
    rng: &mut SimulationRng,
    sink: &mut dyn AudioSink,
) -> Result<RunSummary> {
    let walker = RouteWalker::new(
        &scenario.walker.waypoints(),
        scenario.walker.speed,
        scenario.simulation.fix_interval_ms,
    )?;
    let gps = GpsSensor::new(&scenario.gps)?;
    let compass = Magnetometer::new(&scenario.compass)?;
    let mut engine = GeoEngine::new(scenario.engine.clone());

    tracing::info!(
        "Walking {:.0} m at {:.1} m/s, one fix every {} ms",
        walker.length(),
        scenario.walker.speed,
        scenario.simulation.fix_interval_ms
    );

    let mut summary = RunSummary::default();
    let mut total_error = 0.0;
    for truth in walker.poses() {
        if engine.pipeline_state() == PipelineState::Playing {
            engine.process(SensorInput::AudioQueueEmpty, map, sink);
        }

        if scenario.compass.enabled {
            let heading = compass.measure(&truth, rng);
            engine.process(SensorInput::Heading(heading), map, sink);
        }

        let fix = gps.measure(&truth, scenario.walker.speed, walker.ruler(), rng);
        let output = engine.process(SensorInput::Location(fix), map, sink);
        summary.fixes += 1;

        if !output.callouts.is_empty() {
            summary.batches += 1;
            summary.callouts += output.callouts.len();
        }
        if let Some(matched) = output.matched {
            let error = walker.ruler().distance(&matched.location, &truth.location);
            summary.matched += 1;
            total_error += error;
            summary.max_error = summary.max_error.max(error);
            tracing::trace!(t = truth.timestamp_ms, way = ?matched.way, error, "matched");
        }
    }

    if summary.matched > 0 {
        summary.mean_error = total_error / summary.matched as f64;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::MapFile;
    use crate::simulation::sensors::ConsoleSink;
    use figment::providers::{Format, Toml};
    use figment::Figment;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::path::Path;

    // Elm St runs north through a crossroads with Oak St 30 m north of the origin.
    const CROSSROADS: &str = r#"
        name = "Crossroads"

        [[ways]]
        osm_id = 1
        coordinates = [[-3.1883, 55.9524019], [-3.1883, 55.9535694], [-3.1883, 55.9550963]]
        properties = { name = "Elm St" }

        [[ways]]
        osm_id = 2
        coordinates = [[-3.1891004, 55.9535694], [-3.1883, 55.9535694], [-3.1874996, 55.9535694]]
        properties = { name = "Oak St" }
    "#;

    const HIGH_STREET: &str = r#"
        name = "High Street"

        [[ways]]
        osm_id = 1
        coordinates = [[-3.1883, 55.9524019], [-3.1883, 55.9550963]]
        properties = { name = "High St" }
    "#;

    fn scenario(extra: &str) -> ScenarioConfig {
        let toml = format!(
            r#"
            [simulation]
            map = "crossroads"
            fix_interval_ms = 2000

            [walker]
            route = [[-3.1883, 55.9527611], [-3.1883, 55.9546472]]
            {extra}
            "#
        );
        ScenarioConfig::from_figment(Figment::from(Toml::string(&toml))).unwrap()
    }

    fn replay(scenario: &ScenarioConfig, seed: u64) -> RunSummary {
        replay_on(CROSSROADS, scenario, seed)
    }

    fn replay_on(map: &str, scenario: &ScenarioConfig, seed: u64) -> RunSummary {
        let map = MapFile::parse(map, Path::new("map.toml"))
            .unwrap()
            .to_snapshot()
            .unwrap();
        let mut rng = SimulationRng(ChaCha8Rng::seed_from_u64(seed));
        let mut sink = ConsoleSink::default();
        run_scenario(scenario, &map, &mut rng, &mut sink).unwrap()
    }

    #[test]
    fn test_noiseless_walk_stays_on_road() {
        let scenario = scenario(
            r#"
            [gps]
            noise_sigma = 0.0

            [compass]
            noise_sigma = 0.0
            "#,
        );
        let summary = replay(&scenario, 0);

        // 210 m at 2.8 m per fix, plus the start.
        assert!((76..=77).contains(&summary.fixes), "{summary:?}");
        assert!(summary.matched_ratio() > 0.9, "{summary:?}");
        assert!(summary.mean_error < 1.5, "{summary:?}");
        assert!(summary.callouts > 0, "{summary:?}");
    }

    #[test]
    fn test_noisy_walk_matched_after_warm_up() {
        let scenario = scenario(
            r#"
            [gps]
            noise_sigma = 1.0
            "#,
        );
        for seed in [7, 8, 9] {
            let summary = replay_on(HIGH_STREET, &scenario, seed);

            // Only the first few fixes may go unmatched.
            assert!(summary.matched + 5 >= summary.fixes, "seed {seed}: {summary:?}");
            assert!(summary.max_error < 6.0, "seed {seed}: {summary:?}");
            assert!(summary.mean_error < 2.0, "seed {seed}: {summary:?}");
        }
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let scenario = scenario("");
        assert_eq!(replay(&scenario, 11), replay(&scenario, 11));
    }
}
