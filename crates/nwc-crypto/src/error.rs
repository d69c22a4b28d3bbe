//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during key handling and pairing.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// Invalid signature bytes.
    #[error("invalid signature length: expected 64, got {0}")]
    InvalidSignatureLength(usize),

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// The randomness source is not ready or failed to produce key material.
    #[error("identity generation unavailable: {0}")]
    IdentityGenerationUnavailable(String),

    /// A pairing template is malformed.
    #[error("invalid pairing template: {0}")]
    InvalidPairingTemplate(String),

    /// A pairing secret is malformed.
    #[error("invalid pairing secret: {0}")]
    InvalidSecret(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
