#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for the NWC authorization service.
//!
//! # Usage
//!
//! ```rust,no_run
//! use nwc_config::ServiceConfig;
//!
//! // defaults → ~/.nwc/config.toml → explicit file → NWC_* env fallbacks
//! let resolved = ServiceConfig::load(None).unwrap();
//! println!("data in {}", resolved.config.storage.data_dir);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit** (`--config <path>`)
//! 2. **User** (`~/.nwc/config.toml`)
//! 3. **Environment variables** (`NWC_*`), fallback only
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate has no dependencies on other internal crates. Conversion to
//! engine types happens at the binary boundary.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with precedence.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadOptions, ResolvedConfig};
pub use merge::ConfigLayer;
pub use types::*;

impl ServiceConfig {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(config_file: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(config_file)
    }
}
