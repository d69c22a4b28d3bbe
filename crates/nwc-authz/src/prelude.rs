//! Prelude module - commonly used types for convenient import.
//!
//! Use `use nwc_authz::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuthorizationError, AuthorizationResult, ensure_allowed};

// Service
pub use crate::{AuthorizationService, NwcApi, SettingsStore};

// Re-exported from the engine crates
pub use nwc_budget::Decision;
pub use nwc_registry::{ConnectionRegistry, RegistryLimits};
