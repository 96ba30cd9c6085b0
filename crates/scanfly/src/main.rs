mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scanfly_core::{JsonCapabilityParser, Registry};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("error: {err}");
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a registry.
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        cmd => {
            let config = load_effective_config(&cli.global)?;
            let registry_config = scanfly_config::to_registry_config(&config)?;

            let registry = Registry::start(registry_config, Arc::new(JsonCapabilityParser))?;

            // Static devices only: the initial sweep is trivially done,
            // so listing doesn't wait out the full table timeout.
            registry.discovery().initial_sweep_finished();

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &registry, &cli.global).await;

            registry.shutdown().await;
            result
        }
    }
}

/// Load the config file (honoring `--config`) and apply CLI overrides.
fn load_effective_config(global: &GlobalOpts) -> Result<scanfly_config::Config, CliError> {
    let mut cfg = match &global.config {
        Some(path) => scanfly_config::load_config_from(path)?,
        None => scanfly_config::load_config_or_default(),
    };

    if global.insecure {
        cfg.defaults.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
    }

    Ok(cfg)
}
