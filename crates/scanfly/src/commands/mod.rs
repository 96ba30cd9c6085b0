//! Command handlers.

pub mod config_cmd;
pub mod devices;

use scanfly_core::Registry;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a registry-backed command to its handler.
pub async fn dispatch(
    command: Command,
    registry: &Registry,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        Command::List => devices::handle_list(registry, global).await,
        Command::Options(args) => devices::handle_options(&args, registry, global).await,
        // Handled in main before a registry exists.
        Command::Config(_) => Ok(()),
    }
}
