//! Commonly used telemetry types.
//!
//! ```rust,no_run
//! use nwc_telemetry::prelude::*;
//!
//! # fn main() -> TelemetryResult<()> {
//! setup_logging(&LogConfig::new("debug").with_format(LogFormat::Json))?;
//! let _guard = RequestGuard::new(RequestContext::new("nwcctl").with_operation("pay_invoice"));
//! tracing::info!("authorizing");
//! # Ok(())
//! # }
//! ```

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{FileRotation, LogConfig, LogFormat, LogTarget};

pub use crate::{setup_default_logging, setup_logging};

pub use crate::{RequestContext, RequestGuard};
