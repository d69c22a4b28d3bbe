//! Prelude module - commonly used types for convenient import.
//!
//! Use `use nwc_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Time
pub use crate::{Clock, ManualClock, SystemClock, UnixSeconds};

// Catalog and status
pub use crate::{ConnectionStatus, PermissionCatalog, PermissionEntry};

// Amounts
pub use crate::{MAX_MSATS, Msats};
