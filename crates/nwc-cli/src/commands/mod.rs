//! Subcommand implementations.

pub(crate) mod authorize;
pub(crate) mod config;
pub(crate) mod connections;
pub(crate) mod identity;

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
