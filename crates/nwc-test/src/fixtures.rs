//! Test fixtures for common types.

use nwc_crypto::{KeyPair, PublicKey};
use nwc_registry::{BudgetSpec, NewConnection};
use tracing_subscriber::EnvFilter;

/// A deterministic key pair derived from `seed`.
///
/// The leading byte is pinned to `0x01` so every seed maps to a valid
/// secp256k1 scalar.
///
/// # Panics
///
/// Never in practice; the secret is always in range.
#[must_use]
pub fn test_keypair(seed: u8) -> KeyPair {
    let mut secret = [seed; 32];
    secret[0] = 0x01;
    KeyPair::from_secret_bytes(&secret).expect("secret below the curve order")
}

/// The default test client public key.
#[must_use]
pub fn test_pubkey() -> PublicKey {
    test_keypair(1).public_key()
}

/// The default test client public key, hex-encoded.
#[must_use]
pub fn test_pubkey_hex() -> String {
    test_pubkey().to_hex()
}

/// A distinct client public key per `seed`.
#[must_use]
pub fn test_pubkey_from(seed: u8) -> PublicKey {
    test_keypair(seed).public_key()
}

/// A 100 000 msat daily budget.
#[must_use]
pub fn pay_budget_spec() -> BudgetSpec {
    BudgetSpec::new(100_000, 86_400)
}

/// A never-expiring connection allowed to pay invoices within
/// [`pay_budget_spec`].
#[must_use]
pub fn pay_invoice_request(pubkey: &PublicKey) -> NewConnection {
    NewConnection {
        pubkey: pubkey.to_hex(),
        description: "test client".to_string(),
        permissions: vec!["pay_invoice".to_string()],
        expires_at: 0,
        budgets: vec![pay_budget_spec()],
    }
}

/// Install a test-friendly tracing subscriber, once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
