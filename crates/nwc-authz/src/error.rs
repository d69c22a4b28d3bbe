//! Authorization error types.

use nwc_budget::Decision;
use nwc_core::{CoreError, Msats};
use nwc_crypto::CryptoError;
use nwc_registry::RegistryError;
use nwc_storage::StorageError;
use thiserror::Error;

/// Errors surfaced to transport collaborators.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// No connection exists for the public key.
    #[error("unknown connection: {0}")]
    UnknownConnection(String),

    /// The connection's expiry has been reached.
    #[error("connection expired at {expires_at}")]
    ConnectionExpired {
        /// The expiry timestamp.
        expires_at: i64,
    },

    /// The capability is not covered by the connection's grants.
    #[error("permission denied for {capability}")]
    PermissionDenied {
        /// The requested capability.
        capability: String,
    },

    /// A budget had no headroom for the amount.
    #[error("budget #{budget} exceeded by {shortfall_msats} msats")]
    BudgetExceeded {
        /// Index of the refusing budget.
        budget: usize,
        /// Overshoot.
        shortfall_msats: Msats,
    },

    /// The requested amount is out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A registry operation failed validation or lookup.
    #[error(transparent)]
    Registry(RegistryError),

    /// The persistence layer failed; the action must not proceed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Key handling or pairing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A setting value was rejected.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting {
        /// The setting key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required setting is absent.
    #[error("missing setting: {0}")]
    MissingSetting(String),

    /// Any other failure that must deny the request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthorizationError {
    /// Wallet-connect error code for the response envelope.
    #[must_use]
    pub fn nip47_code(&self) -> &'static str {
        match self {
            Self::UnknownConnection(_) | Self::ConnectionExpired { .. } => "UNAUTHORIZED",
            Self::PermissionDenied { .. } => "RESTRICTED",
            Self::BudgetExceeded { .. } => "QUOTA_EXCEEDED",
            Self::InvalidAmount(_) | Self::InvalidSetting { .. } => "OTHER",
            Self::Registry(RegistryError::NotFound(_)) => "UNAUTHORIZED",
            Self::Registry(_)
            | Self::Storage(_)
            | Self::Crypto(_)
            | Self::MissingSetting(_)
            | Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error is a refusal rather than a malfunction.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::UnknownConnection(_)
                | Self::ConnectionExpired { .. }
                | Self::PermissionDenied { .. }
                | Self::BudgetExceeded { .. }
                | Self::InvalidAmount(_)
        )
    }
}

impl From<RegistryError> for AuthorizationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Storage(e) => Self::Storage(e),
            other => Self::Registry(other),
        }
    }
}

impl From<CoreError> for AuthorizationError {
    fn from(err: CoreError) -> Self {
        Self::Registry(err.into())
    }
}

/// Turn a budget [`Decision`] into a result, mapping a denial to
/// [`AuthorizationError::BudgetExceeded`].
///
/// # Errors
///
/// Returns [`AuthorizationError::BudgetExceeded`] for [`Decision::Denied`].
pub fn ensure_allowed(decision: Decision) -> AuthorizationResult<()> {
    match decision {
        Decision::Allowed => Ok(()),
        Decision::Denied {
            budget,
            shortfall_msats,
        } => Err(AuthorizationError::BudgetExceeded {
            budget,
            shortfall_msats,
        }),
    }
}

/// Result type for authorization operations.
pub type AuthorizationResult<T> = Result<T, AuthorizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nip47_codes() {
        assert_eq!(
            AuthorizationError::UnknownConnection("x".into()).nip47_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            AuthorizationError::ConnectionExpired { expires_at: 1 }.nip47_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            AuthorizationError::PermissionDenied {
                capability: "pay_invoice".into()
            }
            .nip47_code(),
            "RESTRICTED"
        );
        assert_eq!(
            AuthorizationError::BudgetExceeded {
                budget: 0,
                shortfall_msats: 1
            }
            .nip47_code(),
            "QUOTA_EXCEEDED"
        );
        assert_eq!(
            AuthorizationError::Storage(StorageError::Unavailable("down".into())).nip47_code(),
            "INTERNAL"
        );
    }

    #[test]
    fn test_registry_storage_errors_stay_storage() {
        let err: AuthorizationError =
            RegistryError::Storage(StorageError::Unavailable("down".into())).into();
        assert!(matches!(err, AuthorizationError::Storage(_)));
        assert!(!err.is_denial());
    }

    #[test]
    fn test_ensure_allowed() {
        assert!(ensure_allowed(Decision::Allowed).is_ok());
        let err = ensure_allowed(Decision::Denied {
            budget: 1,
            shortfall_msats: 10_000,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            AuthorizationError::BudgetExceeded {
                budget: 1,
                shortfall_msats: 10_000
            }
        ));
    }
}
