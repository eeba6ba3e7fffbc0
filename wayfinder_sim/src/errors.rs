// wayfinder_sim/src/errors.rs

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("scenario file {0:?} does not exist")]
    MissingScenario(PathBuf),

    #[error("invalid scenario: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse map file {path:?}: {source}")]
    MapParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("map data rejected: {0}")]
    Map(#[from] wayfinder_core::errors::Error),

    #[error("map {0:?} is not in the catalog")]
    UnknownMap(String),

    #[error("feature {0} has no coordinates")]
    EmptyGeometry(u64),

    #[error("route needs at least 2 points, got {0}")]
    InvalidRoute(usize),

    #[error("invalid noise sigma: {0}")]
    InvalidNoise(#[from] rand_distr::NormalError),
}

impl From<figment::Error> for SimError {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
