// wayfinder_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Wayfinder: replays a simulated walk through the localization and callout engine.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    pub scenario: PathBuf,

    /// Directory holding the `maps/` catalog.
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,

    /// Overrides the scenario's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter decisions and every callout.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["wayfinder-sim", "walk.toml", "--seed", "7", "-v"]).unwrap();
        assert_eq!(cli.scenario, PathBuf::from("walk.toml"));
        assert_eq!(cli.assets, PathBuf::from("assets"));
        assert_eq!(cli.seed, Some(7));
        assert!(cli.verbose);
    }

    #[test]
    fn test_scenario_is_required() {
        assert!(Cli::try_parse_from(["wayfinder-sim"]).is_err());
    }
}
