// wayfinder_sim/src/lib.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::prelude::*;
use crate::simulation::runner::run_scenario;
use crate::simulation::sensors::ConsoleSink;

// This prelude is for convenience for other files WITHIN the wayfinder_sim crate.
pub mod prelude;

pub mod cli;
pub mod errors;
pub mod simulation;

/// Loads everything `cli` names and replays the scenario once.
pub fn run(cli: &cli::Cli) -> Result<RunSummary> {
    tracing::info!("Loading scenario from: {:?}", cli.scenario);
    let mut scenario = ScenarioConfig::load(&cli.scenario)?;
    if cli.seed.is_some() {
        scenario.simulation.seed = cli.seed;
    }

    let catalog = MapCatalog::load(&cli.assets.join("maps"));
    let map_key = &scenario.simulation.map;
    let map = catalog
        .get(map_key)
        .ok_or_else(|| SimError::UnknownMap(map_key.clone()))?
        .to_snapshot()?;
    tracing::info!(
        map = %map_key,
        ways = map.network().ways().len(),
        intersections = map.network().intersections().len(),
        pois = map.pois().len(),
        "map ready"
    );

    let rng = match scenario.simulation.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut rng = SimulationRng(rng);
    let mut sink = ConsoleSink::default();
    run_scenario(&scenario, &map, &mut rng, &mut sink)
}
