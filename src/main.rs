use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use frecent_run::cli::{self, Cli};

const LOG_ENV: &str = "FRUN_LOG";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let code = cli::run(Cli::parse())?;
    std::process::exit(code);
}
