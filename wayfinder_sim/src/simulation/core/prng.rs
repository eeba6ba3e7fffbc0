// wayfinder_sim/src/simulation/core/prng.rs

use rand_chacha::ChaCha8Rng;

/// The central, deterministic pseudo-random number generator for a run.
///
/// Every sensor draws its noise from this one stream, so a scenario with a fixed seed
/// replays identically.
#[derive(Debug, Clone)]
pub struct SimulationRng(pub ChaCha8Rng);
