//! CLI error type and exit codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("scanner '{name}' not found (run `scanfly list`)")]
    NotFound { name: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Config(#[from] scanfly_config::ConfigError),

    #[error(transparent)]
    Core(#[from] scanfly_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 4,
            Self::Validation { .. } | Self::Config(_) => 2,
            Self::Core(_) => 3,
            Self::Io(_) => 5,
        }
    }
}
