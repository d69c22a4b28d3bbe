//! Run-time hardening for values arriving at the edges of the system.
//!
//! These checks run before any state is touched so malformed or degenerate
//! input never reaches the registry or the ledger.

use crate::error::{CoreError, CoreResult};
use crate::types::{MAX_MSATS, NEVER_EXPIRES, UnixSeconds};

/// Default maximum length of a connection description, in characters.
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 1024;

/// Latest accepted timestamp (seconds).
pub const MAX_TIMESTAMP: UnixSeconds = 1 << 31;

/// SHA-256 digests of inputs that indicate a caller bug rather than a key:
/// the empty string, a single space, `None`, `True` and `False`.
const DEGENERATE_HASHES: &[&str] = &[
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    "36a9e7f1c95b82ffb99743e0c5c4ce95d83c9a430aac59f84ef3cbfab6145068",
    "c1c4b7fbd3e146bb14ec6258e5231c1ec703590721ff1e321b179a62b5857c9c",
    "cdca0b9bb2325fc8ed7eba7734a3a1f876d919221399b6587ae7d26305adee9d",
    "f9e08f8b038b1b401497f17da3adc120667ac742bf035657869a6ca1cd180e69",
];

/// Whether every character is printable (no control characters).
#[must_use]
pub fn is_printable(value: &str) -> bool {
    !value.chars().any(char::is_control)
}

/// Validate a hex-encoded 32-byte public key.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] unless the value is exactly 64
/// lowercase hex characters and not a well-known degenerate digest.
pub fn validate_pubkey_hex(value: &str) -> CoreResult<()> {
    if value.len() != 64 {
        return Err(CoreError::invalid(
            "pubkey",
            format!("expected 64 hex characters, got {}", value.len()),
        ));
    }
    if !value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(CoreError::invalid("pubkey", "not lowercase hex"));
    }
    if DEGENERATE_HASHES.contains(&value) {
        return Err(CoreError::invalid("pubkey", "degenerate key"));
    }
    Ok(())
}

/// Validate a free-text description.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] for non-printable text or text longer
/// than `max_len` characters.
pub fn validate_description(value: &str, max_len: usize) -> CoreResult<()> {
    if !is_printable(value) {
        return Err(CoreError::invalid(
            "description",
            "contains non-printable characters",
        ));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(CoreError::invalid(
            "description",
            format!("{len} characters exceeds the limit of {max_len}"),
        ));
    }
    Ok(())
}

/// Validate an `expires_at` value: `0` (never) or a timestamp in range.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] for negative or far-future values.
pub fn validate_expires_at(value: UnixSeconds) -> CoreResult<()> {
    if value == NEVER_EXPIRES {
        return Ok(());
    }
    if value < 0 {
        return Err(CoreError::invalid("expires_at", "must not be negative"));
    }
    if value > MAX_TIMESTAMP {
        return Err(CoreError::invalid("expires_at", "timestamp is too high"));
    }
    Ok(())
}

/// Validate an msats amount arriving as a signed wire value.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] for negative amounts or amounts at
/// or above [`MAX_MSATS`].
pub fn validate_msats(field: &'static str, value: i64) -> CoreResult<u64> {
    let amount =
        u64::try_from(value).map_err(|_| CoreError::invalid(field, "must not be negative"))?;
    if amount >= MAX_MSATS {
        return Err(CoreError::invalid(field, "msats amount looks too high"));
    }
    Ok(amount)
}
