//! Configuration for the scanfly CLI.
//!
//! TOML file + environment overrides, and translation to
//! `scanfly_core::RegistryConfig`. The core crate never reads config
//! files itself; everything flows through here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scanfly_api::{TlsMode, TransportConfig};
use scanfly_core::{RegistryConfig, StaticDevice};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Statically configured devices, probed before discovery.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// HTTP request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// How long a listing waits for the device table to settle, seconds.
    #[serde(default = "default_list_timeout")]
    pub list_timeout: u64,

    /// Skip TLS certificate verification for `https` scanners.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            list_timeout: default_list_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_list_timeout() -> u64 {
    5
}

/// One `[[devices]]` entry.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeviceEntry {
    /// Device name, used as the registry key.
    pub name: String,

    /// eSCL base URL (e.g., "http://192.168.0.10:8080/eSCL").
    pub url: String,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "scanfly", "scanfly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("scanfly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from a specific file + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SCANFLY_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation to registry settings ────────────────────────────────

/// Build a `RegistryConfig` from the loaded file, validating each
/// static device's URL.
pub fn to_registry_config(cfg: &Config) -> Result<RegistryConfig, ConfigError> {
    let mut static_devices = Vec::with_capacity(cfg.devices.len());
    for entry in &cfg.devices {
        let url: url::Url = entry.url.parse().map_err(|_| ConfigError::Validation {
            field: format!("devices.{}.url", entry.name),
            reason: format!("invalid URL: {}", entry.url),
        })?;
        static_devices.push(StaticDevice {
            name: entry.name.clone(),
            url,
        });
    }

    let tls = if cfg.defaults.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.defaults.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    Ok(RegistryConfig {
        static_devices,
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(cfg.defaults.timeout),
        },
        list_timeout: Duration::from_secs(cfg.defaults.list_timeout),
    })
}
