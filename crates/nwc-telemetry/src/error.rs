//! Errors reported while installing the logging stack.

use std::path::PathBuf;

use thiserror::Error;

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or an extra directive is not a valid filter.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// The offending level or directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A log format name outside pretty, compact, json and full.
    #[error("unknown log format `{0}`")]
    UnknownFormat(String),

    /// The directory for rolling log files could not be created.
    #[error("cannot create log directory {}: {source}", path.display())]
    LogDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Another global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
