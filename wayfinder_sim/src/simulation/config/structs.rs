// wayfinder_sim/src/simulation/config/structs.rs

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use wayfinder_core::config::EngineConfig;
use wayfinder_core::types::LngLatAlt;

use crate::errors::{Result, SimError};

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub walker: Walker,

    #[serde(default)]
    pub gps: Gps,

    #[serde(default)]
    pub compass: Compass,

    /// Passed to the engine untouched.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ScenarioConfig {
    /// The scenario file layered under `WAYFINDER_` environment overrides.
    ///
    /// Nested keys use a double underscore, e.g. `WAYFINDER_SIMULATION__SEED=7`.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("WAYFINDER_").split("__"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SimError::MissingScenario(path.to_path_buf()));
        }
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        if config.walker.route.len() < 2 {
            return Err(SimError::InvalidRoute(config.walker.route.len()));
        }
        Ok(config)
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Catalog key of the map, e.g. "edinburgh.old_town".
    pub map: String,
    /// Time between two location fixes.
    #[serde(default = "default_fix_interval_ms")]
    pub fix_interval_ms: u64,
}

fn default_fix_interval_ms() -> u64 {
    1_000
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            map: "default".to_owned(),
            fix_interval_ms: default_fix_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Walker {
    /// Constant ground speed in m/s.
    pub speed: f64,
    /// Waypoints as `[longitude, latitude]` pairs.
    pub route: Vec<[f64; 2]>,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            speed: 1.4,
            route: Vec::new(),
        }
    }
}

impl Walker {
    pub fn waypoints(&self) -> Vec<LngLatAlt> {
        self.route.iter().map(|[lon, lat]| LngLatAlt::new(*lon, *lat)).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Gps {
    /// Standard deviation of the east and north position noise, in meters.
    pub noise_sigma: f64,
    /// Accuracy the fixes claim to have.
    pub accuracy: f64,
    /// Whether fixes carry the walker's true speed.
    pub report_speed: bool,
}

impl Default for Gps {
    fn default() -> Self {
        Self {
            noise_sigma: 2.0,
            accuracy: 5.0,
            report_speed: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Compass {
    pub enabled: bool,
    /// Standard deviation of the heading noise, in degrees.
    pub noise_sigma: f64,
    pub accuracy: f64,
}

impl Default for Compass {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_sigma: 5.0,
            accuracy: 10.0,
        }
    }
}
