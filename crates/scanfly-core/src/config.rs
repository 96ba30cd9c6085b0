// ── Registry configuration ──
//
// Built by the CLI (or tests) and handed to `Registry::start` — core
// never reads config files itself.

use std::time::Duration;

use url::Url;

use scanfly_api::TransportConfig;

/// How long `list_devices` waits for the table to settle.
pub const TABLE_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// A manually configured (non-discovered) device.
#[derive(Debug, Clone)]
pub struct StaticDevice {
    /// Unique device name, used as the registry key.
    pub name: String,
    /// eSCL base URL (e.g. `http://192.168.0.10:8080/eSCL`).
    pub url: Url,
}

/// Configuration for starting a [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Devices added unconditionally before discovery begins.
    pub static_devices: Vec<StaticDevice>,
    /// HTTP transport settings shared by every fetch.
    pub transport: TransportConfig,
    /// Upper bound on the `list_devices` wait.
    pub list_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            static_devices: Vec::new(),
            transport: TransportConfig::default(),
            list_timeout: TABLE_READY_TIMEOUT,
        }
    }
}
