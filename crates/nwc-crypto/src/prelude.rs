//! Prelude module - commonly used types for convenient import.
//!
//! Use `use nwc_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key types
pub use crate::{KeyPair, PublicKey};

// Identity generation
pub use crate::{EntropySource, IdentityProvider, OsEntropy};

// Pairing
pub use crate::{PairingTemplate, RequestOrigin, build_pairing_credential};
