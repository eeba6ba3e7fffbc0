// wayfinder_sim/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wayfinder_sim::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let default_directives = if cli.verbose {
        "wayfinder_sim=debug,wayfinder_core=debug"
    } else {
        "wayfinder_sim=info,wayfinder_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match wayfinder_sim::run(&cli) {
        Ok(summary) => summary.log(),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
