//! Environment variable fallbacks.
//!
//! `NWC_*` variables are **fallback**, not override: they only fill fields
//! that no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "NWC_DATA_DIR",
        field_path: "storage.data_dir",
    },
    EnvMapping {
        var_name: "NWC_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "NWC_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "NWC_RELAY",
        field_path: "provider.relay",
    },
    EnvMapping {
        var_name: "NWC_RELAY_ALIAS",
        field_path: "provider.relay_alias",
    },
    EnvMapping {
        var_name: "NWC_MAX_DESCRIPTION_LEN",
        field_path: "limits.max_description_len",
    },
];

/// Apply environment variable fallbacks to fields no config file set.
///
/// Returns the number of variables applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            if set_field_from_string(merged, mapping.field_path, val) {
                sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
                count = count.saturating_add(1);
            }
        }
    }

    count
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) -> bool {
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        return insert_leaf(root, path, coerce_to_toml_value(path, val));
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return false;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    insert_leaf(current, leaf, coerce_to_toml_value(path, val))
}

fn insert_leaf(parent: &mut toml::Value, leaf: &str, value: toml::Value) -> bool {
    match parent.as_table_mut() {
        Some(table) => {
            table.insert(leaf.to_owned(), value);
            true
        },
        None => false,
    }
}

fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if path == "limits.max_description_len"
        && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }
    toml::Value::String(val.to_owned())
}
