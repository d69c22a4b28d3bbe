//! Configuration struct definitions.

use serde::{Deserialize, Serialize};

/// Service configuration after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Persistence location.
    pub storage: StorageSection,
    /// Logging level, format and per-crate directives.
    pub logging: LoggingSection,
    /// Relay advertised in pairing templates.
    pub provider: ProviderSection,
    /// Edge input limits.
    pub limits: LimitsSection,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for the file-backed store.
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "~/.nwc/data".to_owned(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["nwc_registry=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

/// `[provider]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    /// Relay seeded into the settings map on first start.
    pub relay: String,
    /// Public relay URL seeded into the settings map on first start.
    pub relay_alias: String,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            relay: "nostrclient".to_owned(),
            relay_alias: String::new(),
        }
    }
}

/// `[limits]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    /// Longest accepted connection description, in characters.
    pub max_description_len: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_description_len: 1024,
        }
    }
}
