//! Config commands: file configuration and stored provider settings.

use std::collections::BTreeMap;

use anyhow::Context;
use colored::Colorize;
use nwc_authz::NwcApi;
use nwc_config::{ConfigLayer, ResolvedConfig};

use crate::commands::print_json;
use crate::theme::Theme;

/// Show the resolved file configuration with the layer each field came from.
pub(crate) fn show_config(resolved: &ResolvedConfig, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&resolved.config);
    }

    println!("\n{}", Theme::header("Configuration"));
    if resolved.loaded_files.is_empty() {
        println!("{}", Theme::dimmed("  no config files found, using defaults"));
    }
    for file in &resolved.loaded_files {
        println!("{}", Theme::kv("Loaded", file));
    }
    println!("{}", Theme::separator());

    let rendered = toml_lines(resolved)?;
    for (field, value) in rendered {
        let source = resolved
            .field_sources
            .get(&field)
            .unwrap_or(&ConfigLayer::Defaults);
        println!("{field} = {value}  {}", format!("# {source}").dimmed());
    }
    println!();
    Ok(())
}

fn toml_lines(resolved: &ResolvedConfig) -> anyhow::Result<BTreeMap<String, String>> {
    let value = serde_json::to_value(&resolved.config).context("rendering config")?;
    let mut out = BTreeMap::new();
    flatten("", &value, &mut out);
    Ok(out)
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut BTreeMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&path, v, out);
            }
        },
        other => {
            out.insert(prefix.to_string(), other.to_string());
        },
    }
}

/// Print one stored setting, or all of them.
pub(crate) async fn get_settings(api: &NwcApi, key: Option<&str>, json: bool) -> anyhow::Result<()> {
    let values: BTreeMap<String, Option<String>> = match key {
        Some(key) => api.get_config_key(key).await?,
        None => api
            .get_config()
            .await?
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect(),
    };
    if json {
        return print_json(&redacted(values));
    }
    for (k, v) in redacted(values) {
        let shown = v.unwrap_or_else(|| Theme::dimmed("<unset>"));
        println!("{k} = {shown}");
    }
    Ok(())
}

/// Write `key=value` pairs; nothing is written if any pair is rejected.
pub(crate) async fn set_settings(api: &NwcApi, pairs: &[String]) -> anyhow::Result<()> {
    let mut values = BTreeMap::new();
    for pair in pairs {
        let (k, v) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{pair}'"))?;
        values.insert(k.trim().to_string(), v.trim().to_string());
    }
    api.set_config(&values).await?;
    println!(
        "{}",
        Theme::success(&format!("Updated {} setting(s).", values.len()))
    );
    Ok(())
}

fn redacted(values: BTreeMap<String, Option<String>>) -> BTreeMap<String, Option<String>> {
    values
        .into_iter()
        .map(|(k, v)| {
            let v = if k == nwc_authz::SettingKey::ProviderKey.as_str() {
                v.map(|_| "<redacted>".to_string())
            } else {
                v
            };
            (k, v)
        })
        .collect()
}
