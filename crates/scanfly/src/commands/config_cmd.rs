//! `config` command handlers. These never start a registry.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::print_output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(scanfly_config::config_path);
            print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = crate::load_effective_config(global)?;
            let out = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)
                    .map_err(|e| std::io::Error::other(e.to_string()))?,
                OutputFormat::JsonCompact => serde_json::to_string(&cfg)
                    .map_err(|e| std::io::Error::other(e.to_string()))?,
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(scanfly_config::ConfigError::from)?
                }
            };
            print_output(&out, global.quiet);
            Ok(())
        }
    }
}
