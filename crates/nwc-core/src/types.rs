//! Shared scalar types.

/// Seconds since the Unix epoch.
pub type UnixSeconds = i64;

/// Millisatoshi, the base accounting unit for every spend amount.
pub type Msats = u64;

/// `expires_at` sentinel for a connection that never expires.
pub const NEVER_EXPIRES: UnixSeconds = 0;

/// Upper bound (exclusive) for any single msats value: 10M sats.
pub const MAX_MSATS: Msats = 10_000_000 * 1000;
