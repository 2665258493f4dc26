//! # Configuration
//!
//! Built once at startup (TOML file, then command line overrides) and handed to
//! the constructors that need it. Nothing below reads global state.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "etcdhcp::";
pub const DEFAULT_AUTO_SYNC_SECS: u64 = 60;
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one etcd endpoint must be provided")]
    NoEndpoints,
    #[error("at least one dhcp prefix must be provided")]
    NoPrefixes,
    #[error("the hostapd control address must be provided")]
    NoControllerAddress,
    #[error("the render timeout must be greater than zero")]
    ZeroRenderTimeout,
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("friendly names must be a JSON string to string map: {0}")]
    FriendlyNames(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub controller: ControllerConfig,
    /// Attachment point identifier to display name.
    pub rename: HashMap<String, String>,
    pub render_timeout_secs: u64,
    /// Look up device manufacturers from the hardware address.
    pub manufacturer_lookup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub endpoints: Vec<String>,
    pub prefixes: Vec<String>,
    /// How often the endpoint list is refreshed from the cluster. Zero disables it.
    pub auto_sync_interval_secs: u64,
    pub dial_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            controller: ControllerConfig::default(),
            rename: HashMap::new(),
            render_timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            manufacturer_lookup: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            prefixes: vec![DEFAULT_PREFIX.to_string()],
            auto_sync_interval_secs: DEFAULT_AUTO_SYNC_SECS,
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
        }
    }
}

impl StoreConfig {
    pub fn auto_sync_interval(&self) -> Option<Duration> {
        match self.auto_sync_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    /// Merges a JSON object of friendly names into the rename table.
    pub fn merge_friendly_names(&mut self, json: &str) -> Result<(), ConfigError> {
        let names: HashMap<String, String> = serde_json::from_str(json)?;
        self.rename.extend(names);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::NoEndpoints);
        }
        if self.store.prefixes.is_empty() {
            return Err(ConfigError::NoPrefixes);
        }
        if self.controller.address.trim().is_empty() {
            return Err(ConfigError::NoControllerAddress);
        }
        if self.render_timeout_secs == 0 {
            return Err(ConfigError::ZeroRenderTimeout);
        }
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
