//! NWC Authz - the authorization entry point for paired clients.
//!
//! This crate provides:
//! - [`AuthorizationService`]: the single choke point deciding whether a
//!   request from a client public key, for a capability and amount, may run
//! - [`SettingsStore`]: the provider settings map with a typed view of the
//!   keys the pairing flow relies on
//! - [`NwcApi`]: the administrative operations a transport maps to routes
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use nwc_authz::{AuthorizationService, ensure_allowed};
//! use nwc_core::{ManualClock, PermissionCatalog};
//! use nwc_registry::{BudgetSpec, ConnectionRegistry, NewConnection, RegistryLimits};
//! use nwc_storage::MemoryKvStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(
//!     ConnectionRegistry::open(
//!         Arc::new(MemoryKvStore::new()),
//!         PermissionCatalog::standard(),
//!         Arc::new(ManualClock::new(1_700_000_000)),
//!         RegistryLimits::default(),
//!     )
//!     .await?,
//! );
//! let conn = registry
//!     .create(NewConnection {
//!         pubkey: "b889ff5b1513b641e2a139f661a661364979c5beee91842f8f0ef42ab558e9d4".into(),
//!         description: String::new(),
//!         permissions: vec!["pay_invoice".into()],
//!         expires_at: 0,
//!         budgets: vec![BudgetSpec::new(100_000, 86_400)],
//!     })
//!     .await?;
//!
//! let service = AuthorizationService::new(registry);
//! let decision = service.authorize(&conn.pubkey, "pay_invoice", 40_000).await?;
//! ensure_allowed(decision)?;
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

pub mod api;
pub mod error;
pub mod service;
pub mod settings;

pub use api::{
    BudgetView, ConnectionData, ConnectionResponse, DeleteResponse, NwcApi, PermissionView,
    RegistrationRequest,
};
pub use error::{AuthorizationError, AuthorizationResult, ensure_allowed};
pub use service::AuthorizationService;
pub use settings::{DEFAULT_RELAY, NS_CONFIG, ProviderSettings, SettingKey, SettingsStore};
