//! Prelude module - commonly used types for convenient import.
//!
//! Use `use nwc_registry::prelude::*;` to import all essential types.

// Errors
pub use crate::{RegistryError, RegistryResult};

// Registry
pub use crate::{ConnectionHandle, ConnectionRegistry, RegistryLimits};

// Records
pub use crate::{BudgetSpec, Connection, NewConnection};
