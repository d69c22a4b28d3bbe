//! Config file discovery and layered loading.
//!
//! 1. Parse `defaults.toml` → base
//! 2. Merge `~/.nwc/config.toml` (user)
//! 3. Merge the file passed with `--config` (explicit)
//! 4. Apply `NWC_*` env var fallbacks for fields no file set
//! 5. Deserialize, expand `~/` in `storage.data_dir`, validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::types::ServiceConfig;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration and where its values came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The merged configuration.
    pub config: ServiceConfig,
    /// Layer that set each field.
    pub field_sources: FieldSources,
    /// Files merged, in order.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// The storage directory as a path.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.data_dir)
    }
}

/// Inputs to [`load_with`]; every field defaults to the real environment.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Home directory override.
    pub home_dir: Option<PathBuf>,
    /// Explicit config file, merged after the user file.
    pub config_file: Option<PathBuf>,
    /// Environment override; `None` reads the process environment.
    pub env_vars: Option<HashMap<String, String>>,
}

/// Load with the process environment and an optional explicit file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(config_file: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with(LoadOptions {
        config_file: config_file.map(Path::to_path_buf),
        ..LoadOptions::default()
    })
}

/// Load the configuration with layered file precedence.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, an explicit
/// file is missing, or the final merged configuration fails validation.
pub fn load_with(options: LoadOptions) -> ConfigResult<ResolvedConfig> {
    let env_vars = options.env_vars.unwrap_or_else(collect_env_vars);
    let home_dir = match options.home_dir {
        Some(h) => h,
        None => home_directory()?,
    };

    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    // 2. User config.
    let user_path = home_dir.join(".nwc").join("config.toml");
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge_tracking(&mut merged, &overlay, "", &ConfigLayer::User, &mut field_sources);
        loaded_files.push(user_path.display().to_string());
        info!(path = %user_path.display(), "loaded user config");
    }

    // 3. Explicit config; unlike the user file it must exist.
    if let Some(path) = options.config_file {
        let overlay = try_load_file(&path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
        })?;
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::Explicit,
            &mut field_sources,
        );
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded explicit config");
    }

    // 4. Env fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, &env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 5. Deserialize, expand, validate.
    let mut config: ServiceConfig =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;
    config.storage.data_dir = expand_home(&config.storage.data_dir, &home_dir);
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> ConfigResult<ServiceConfig> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
    })?;
    let config: ServiceConfig =
        value
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.display().to_string(),
                source: e,
            })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    // Size is checked after reading to avoid a stat/read race.
    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

fn expand_home(path: &str, home_dir: &Path) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir.join(rest).display().to_string(),
        None if path == "~" => home_dir.display().to_string(),
        None => path.to_owned(),
    }
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(home: &Path) -> LoadOptions {
        LoadOptions {
            home_dir: Some(home.to_path_buf()),
            config_file: None,
            env_vars: Some(HashMap::new()),
        }
    }

    fn write_user_config(home: &Path, body: &str) {
        let dir = home.join(".nwc");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), body).unwrap();
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: ServiceConfig = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_load_defaults_only() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with(options(home.path())).unwrap();
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(resolved.config.provider.relay, "nostrclient");
        assert_eq!(resolved.data_dir(), home.path().join(".nwc/data"));
        assert_eq!(
            resolved.field_sources.get("logging.level"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_user_then_explicit_precedence() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(
            home.path(),
            "[logging]\nlevel = \"debug\"\nformat = \"json\"\n",
        );
        let explicit = home.path().join("override.toml");
        std::fs::write(&explicit, "[logging]\nlevel = \"warn\"\n").unwrap();

        let mut opts = options(home.path());
        opts.config_file = Some(explicit);
        let resolved = load_with(opts).unwrap();

        assert_eq!(resolved.config.logging.level, "warn");
        assert_eq!(resolved.config.logging.format, "json");
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.field_sources.get("logging.level"),
            Some(&ConfigLayer::Explicit)
        );
    }

    #[test]
    fn test_env_fallback_applies_over_defaults_only() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(home.path(), "[provider]\nrelay = \"wss://file.example\"\n");

        let mut opts = options(home.path());
        opts.env_vars = Some(HashMap::from([
            ("NWC_RELAY".to_owned(), "wss://env.example".to_owned()),
            ("NWC_DATA_DIR".to_owned(), "/var/lib/nwc".to_owned()),
        ]));
        let resolved = load_with(opts).unwrap();

        assert_eq!(resolved.config.provider.relay, "wss://file.example");
        assert_eq!(resolved.config.storage.data_dir, "/var/lib/nwc");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let mut opts = options(home.path());
        opts.config_file = Some(home.path().join("absent.toml"));
        assert!(matches!(load_with(opts), Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(home.path(), "[limits]\nmax_description_len = 0\n");
        assert!(matches!(
            load_with(options(home.path())),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(home.path(), "[logging\nlevel = ");
        assert!(matches!(
            load_with(options(home.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_load_file_standalone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/srv/nwc\"\n").unwrap();
        let config = load_file(&path).unwrap();
        assert_eq!(config.storage.data_dir, "/srv/nwc");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/op");
        assert_eq!(expand_home("~/x", home), "/home/op/x");
        assert_eq!(expand_home("/abs", home), "/abs");
    }
}
