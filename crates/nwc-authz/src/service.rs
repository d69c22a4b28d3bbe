//! The authorization choke point.
//!
//! Every spend or command from a paired client passes through
//! [`AuthorizationService::authorize_action`]: connection lookup, liveness,
//! permission, then the budget ledger.

use std::sync::Arc;

use nwc_budget::Decision;
use nwc_core::{MAX_MSATS, Msats, UnixSeconds};
use nwc_crypto::PublicKey;
use nwc_registry::{ConnectionHandle, ConnectionRegistry, RegistryError};
use tracing::{debug, info, warn};

use crate::error::{AuthorizationError, AuthorizationResult};

/// Decides whether a client request may proceed.
#[derive(Debug, Clone)]
pub struct AuthorizationService {
    registry: Arc<ConnectionRegistry>,
}

impl AuthorizationService {
    /// Create a service over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Authorize `capability` for `pubkey` with a spend of `amount_msats` at `now`.
    ///
    /// Non-spending commands pass `0`. On [`Decision::Allowed`] the amount
    /// has been charged to every budget and `last_used` is `now`.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::UnknownConnection`] if no connection matches
    /// - [`AuthorizationError::ConnectionExpired`] once `expires_at` is reached
    /// - [`AuthorizationError::PermissionDenied`] if no grant covers `capability`
    /// - [`AuthorizationError::InvalidAmount`] for amounts at or above the ceiling
    /// - [`AuthorizationError::Storage`] if the ledger state cannot be persisted
    pub async fn authorize_action(
        &self,
        pubkey: &PublicKey,
        capability: &str,
        amount_msats: Msats,
        now: UnixSeconds,
    ) -> AuthorizationResult<Decision> {
        let handle = self.check_access(pubkey, capability, now).await?;

        if amount_msats >= MAX_MSATS {
            warn!(pubkey = %pubkey.key_id_hex(), amount_msats, "amount out of range");
            return Err(AuthorizationError::InvalidAmount(format!(
                "{amount_msats} msats looks too high"
            )));
        }

        let decision = self
            .registry
            .charge(&handle, amount_msats, now)
            .await
            .map_err(|e| match e {
                RegistryError::NotFound(key) => AuthorizationError::UnknownConnection(key),
                other => {
                    warn!(pubkey = %pubkey.key_id_hex(), error = %other, "ledger update failed");
                    other.into()
                },
            })?;

        match decision {
            Decision::Allowed => {
                info!(
                    pubkey = %pubkey.key_id_hex(),
                    capability,
                    amount_msats,
                    "action authorized"
                );
            },
            Decision::Denied {
                budget,
                shortfall_msats,
            } => {
                warn!(
                    pubkey = %pubkey.key_id_hex(),
                    capability,
                    amount_msats,
                    budget,
                    shortfall_msats,
                    "budget exceeded"
                );
            },
        }
        Ok(decision)
    }

    /// [`authorize_action`](Self::authorize_action) at the registry clock's time.
    ///
    /// # Errors
    ///
    /// See [`authorize_action`](Self::authorize_action).
    pub async fn authorize(
        &self,
        pubkey: &PublicKey,
        capability: &str,
        amount_msats: Msats,
    ) -> AuthorizationResult<Decision> {
        let now = self.registry.now();
        self.authorize_action(pubkey, capability, amount_msats, now)
            .await
    }

    /// Supported methods the connection may call, in `supported` order.
    ///
    /// Used to answer `get_info`. Requires a live connection holding the
    /// `get_info` capability.
    ///
    /// # Errors
    ///
    /// The lookup, liveness and permission errors of
    /// [`authorize_action`](Self::authorize_action).
    pub async fn allowed_methods<'a>(
        &self,
        pubkey: &PublicKey,
        supported: &[&'a str],
    ) -> AuthorizationResult<Vec<&'a str>> {
        let now = self.registry.now();
        let handle = self.check_access(pubkey, "get_info", now).await?;
        Ok(self
            .registry
            .catalog()
            .allowed_methods(handle.permissions(), supported))
    }

    async fn check_access(
        &self,
        pubkey: &PublicKey,
        capability: &str,
        now: UnixSeconds,
    ) -> AuthorizationResult<ConnectionHandle> {
        let handle = self.registry.handle(pubkey).await.map_err(|e| match e {
            RegistryError::NotFound(key) => {
                debug!(pubkey = %pubkey.key_id_hex(), "unknown connection");
                AuthorizationError::UnknownConnection(key)
            },
            other => other.into(),
        })?;

        if !handle.status(now).is_active() {
            debug!(pubkey = %pubkey.key_id_hex(), "connection expired");
            return Err(AuthorizationError::ConnectionExpired {
                expires_at: handle.expires_at(),
            });
        }

        if !self
            .registry
            .catalog()
            .grants(handle.permissions(), capability)
        {
            warn!(pubkey = %pubkey.key_id_hex(), capability, "permission denied");
            return Err(AuthorizationError::PermissionDenied {
                capability: capability.to_string(),
            });
        }

        Ok(handle)
    }
}
