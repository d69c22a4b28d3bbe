//! NWC Test - Shared test utilities for the authorization engine.
//!
//! This crate provides storage mocks and fixtures that can be used across
//! the workspace as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! nwc-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use nwc_test::{FlakyKvStore, pay_invoice_request, test_pubkey_hex};
//!
//! let store = std::sync::Arc::new(FlakyKvStore::new());
//! store.fail_writes(true);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
