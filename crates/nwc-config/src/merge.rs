//! Layered configuration merging with source tracking.

use std::collections::HashMap;
use std::fmt;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// `~/.nwc/config.toml`.
    User,
    /// A file named on the command line.
    Explicit,
    /// An `NWC_*` environment variable.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user"),
            Self::Explicit => write!(f, "explicit"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// Dotted field path → layer that last set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Deep-merge `overlay` into `base`, recording the layer of each leaf it sets.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    if overlay_val.is_table() {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    } else {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer.clone());
                    }
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Record every leaf under `val` as set by `layer`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: &ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_deep_merge_tables_and_scalars() {
        let mut base = parse("[logging]\nlevel = \"info\"\nformat = \"compact\"\n");
        let overlay = parse("[logging]\nlevel = \"debug\"\n[provider]\nrelay = \"wss://r\"\n");
        deep_merge(&mut base, &overlay);
        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(base["logging"]["format"].as_str(), Some("compact"));
        assert_eq!(base["provider"]["relay"].as_str(), Some("wss://r"));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("[logging]\ndirectives = [\"a=debug\", \"b=warn\"]\n");
        let overlay = parse("[logging]\ndirectives = [\"c=info\"]\n");
        deep_merge(&mut base, &overlay);
        assert_eq!(base["logging"]["directives"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_tracking_records_layer() {
        let mut base = parse("[storage]\ndata_dir = \"/a\"\n");
        let mut sources = FieldSources::new();
        record_leaves(&base.clone(), "", &ConfigLayer::Defaults, &mut sources);
        let overlay = parse("[storage]\ndata_dir = \"/b\"\n[limits]\nmax_description_len = 10\n");
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(sources.get("storage.data_dir"), Some(&ConfigLayer::User));
        assert_eq!(
            sources.get("limits.max_description_len"),
            Some(&ConfigLayer::User)
        );
    }
}
