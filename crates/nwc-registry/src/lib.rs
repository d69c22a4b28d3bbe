//! NWC Registry - the set of paired connections.
//!
//! [`ConnectionRegistry`] owns every [`Connection`]: its public key, granted
//! permission keys, expiry and budgets. Each connection carries its own
//! [`BudgetLedger`](nwc_budget::BudgetLedger), so spends on different
//! connections never contend. Records are persisted one JSON document per
//! connection through a [`KvStore`](nwc_storage::KvStore).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use nwc_core::{ManualClock, PermissionCatalog};
//! use nwc_registry::{BudgetSpec, ConnectionRegistry, NewConnection, RegistryLimits};
//! use nwc_storage::MemoryKvStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> nwc_registry::RegistryResult<()> {
//! let registry = ConnectionRegistry::open(
//!     Arc::new(MemoryKvStore::new()),
//!     PermissionCatalog::standard(),
//!     Arc::new(ManualClock::new(1_700_000_000)),
//!     RegistryLimits::default(),
//! )
//! .await?;
//!
//! let conn = registry
//!     .create(NewConnection {
//!         pubkey: "b889ff5b1513b641e2a139f661a661364979c5beee91842f8f0ef42ab558e9d4".into(),
//!         description: "coffee shop".into(),
//!         permissions: vec!["pay_invoice".into()],
//!         expires_at: 0,
//!         budgets: vec![BudgetSpec::new(100_000, 86_400)],
//!     })
//!     .await?;
//! assert_eq!(conn.budgets[0].used_msats, 0);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

pub mod prelude;

pub mod connection;
pub mod error;
pub mod registry;

pub use connection::{BudgetSpec, Connection, NewConnection};
pub use error::{RegistryError, RegistryResult};
pub use registry::{ConnectionHandle, ConnectionRegistry, NS_CONNECTIONS, RegistryLimits};
