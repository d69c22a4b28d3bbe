//! NWC Crypto - Pairing key exchange for wallet-connect clients.
//!
//! This crate provides:
//! - secp256k1 key pairs with x-only (BIP340) public keys
//! - Hex-encoded public keys identifying connections
//! - An [`IdentityProvider`] whose readiness is an awaitable signal
//! - The pairing template and client-side credential substitution
//!
//! The server side only ever stores a [`PublicKey`]. Secret material is
//! generated for, and held by, the client half of the pairing ceremony.
//!
//! # Example
//!
//! ```
//! use nwc_crypto::{IdentityProvider, PairingTemplate, build_pairing_credential};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), nwc_crypto::CryptoError> {
//! let provider = IdentityProvider::new();
//! let service = provider.generate_identity().await?;
//! let client = provider.generate_identity().await?;
//!
//! // Server side: no secret involved.
//! let template = PairingTemplate::new(&service.public_key(), "wss://relay.example.com")?;
//!
//! // Client side: substitute the locally held secret.
//! let credential = build_pairing_credential(template.as_str(), &client.secret_hex())?;
//! assert!(credential.starts_with("nostr+walletconnect://"));
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

mod error;
mod keypair;
mod pairing;
mod readiness;

pub use error::{CryptoError, CryptoResult};
pub use keypair::{KeyPair, PublicKey};
pub use pairing::{
    PAIRING_SCHEME, PairingTemplate, RequestOrigin, SECRET_PLACEHOLDER, build_pairing_credential,
    resolve_relay,
};
pub use readiness::{EntropySource, IdentityProvider, OsEntropy};
