//! NWC Core - Foundation types for the wallet-connect authorization engine.
//!
//! This crate provides:
//! - The static [`PermissionCatalog`] of capabilities a connection can be granted
//! - [`ConnectionStatus`] derivation from expiry and time
//! - The [`Clock`] abstraction used by every time-dependent component
//! - Edge input hardening (pubkeys, descriptions, amounts, timestamps)
//!
//! # Example
//!
//! ```
//! use nwc_core::{ConnectionStatus, PermissionCatalog};
//!
//! let catalog = PermissionCatalog::standard();
//! assert!(catalog.contains("pay_invoice"));
//!
//! // `0` means the connection never expires.
//! assert_eq!(ConnectionStatus::evaluate(0, 1_700_000_000), ConnectionStatus::Active);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

pub mod prelude;

pub mod clock;
pub mod error;
pub mod hardening;
pub mod permission;
pub mod status;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use permission::{PermissionCatalog, PermissionEntry};
pub use status::ConnectionStatus;
pub use types::{MAX_MSATS, Msats, NEVER_EXPIRES, UnixSeconds};
