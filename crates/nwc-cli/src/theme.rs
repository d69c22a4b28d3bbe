//! CLI theme and styling.

use colored::Colorize;
use nwc_core::{ConnectionStatus, NEVER_EXPIRES, UnixSeconds};

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("  {:<14} {}", format!("{key}:").bold(), value)
    }

    /// Format a connection status.
    pub(crate) fn status(status: ConnectionStatus) -> String {
        match status {
            ConnectionStatus::Active => "active".green().to_string(),
            ConnectionStatus::Expired => "expired".red().to_string(),
        }
    }

    /// Format a public key (shortened).
    pub(crate) fn pubkey(hex: &str) -> String {
        let short: String = hex.chars().take(16).collect();
        format!("{}", short.cyan())
    }

    /// Format a unix timestamp; `0` renders as `never`.
    pub(crate) fn timestamp(ts: UnixSeconds) -> String {
        if ts == NEVER_EXPIRES {
            return "never".dimmed().to_string();
        }
        chrono::DateTime::from_timestamp(ts, 0).map_or_else(
            || ts.to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
        )
    }
}
