//! Logical external interface.
//!
//! [`NwcApi`] exposes the administrative operations a transport layer maps
//! onto its routes. Requests and responses are plain serde types; the wire
//! shape is left to the transport.

use std::collections::BTreeMap;

use nwc_budget::Budget;
use nwc_core::hardening::validate_pubkey_hex;
use nwc_core::{ConnectionStatus, Msats, PermissionEntry, UnixSeconds};
use nwc_crypto::{PairingTemplate, PublicKey, RequestOrigin, resolve_relay};
use nwc_registry::{BudgetSpec, Connection, NewConnection};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AuthorizationError, AuthorizationResult};
use crate::service::AuthorizationService;
use crate::settings::SettingsStore;

/// A catalog entry as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionView {
    /// Stable key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Granted by default in the creation form.
    pub default: bool,
}

impl From<&PermissionEntry> for PermissionView {
    fn from(entry: &PermissionEntry) -> Self {
        Self {
            key: entry.key.to_string(),
            name: entry.name.to_string(),
            default: entry.default,
        }
    }
}

/// Body of a connection registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Permission keys to grant.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Free-text label.
    #[serde(default)]
    pub description: String,
    /// Expiry; `0` never expires.
    #[serde(default)]
    pub expires_at: UnixSeconds,
    /// Budgets to attach.
    #[serde(default)]
    pub budgets: Vec<BudgetSpec>,
}

/// Connection metadata in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    /// Client public key, hex.
    pub pubkey: String,
    /// Free-text label.
    pub description: String,
    /// Granted permission keys.
    pub permissions: Vec<String>,
    /// Expiry; `0` never expires.
    pub expires_at: UnixSeconds,
    /// Creation time.
    pub created_at: UnixSeconds,
    /// Last authorized action.
    pub last_used: UnixSeconds,
    /// Status at response time.
    pub status: ConnectionStatus,
}

/// A budget in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetView {
    /// Cap per period.
    pub budget_msats: Msats,
    /// Consumed in the period.
    pub used_msats: Msats,
    /// Period length; `0` is a lifetime cap.
    pub refresh_window: u64,
    /// Period start.
    pub window_start: UnixSeconds,
    /// Definition time.
    pub created_at: UnixSeconds,
    /// When the period ends, for resetting budgets.
    pub next_reset: Option<UnixSeconds>,
}

impl From<&Budget> for BudgetView {
    fn from(budget: &Budget) -> Self {
        Self {
            budget_msats: budget.budget_msats,
            used_msats: budget.used_msats,
            refresh_window: budget.refresh_window,
            window_start: budget.window_start,
            created_at: budget.created_at,
            next_reset: budget.next_reset(),
        }
    }
}

/// A connection with its budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    /// Connection metadata.
    pub data: ConnectionData,
    /// Budgets in connection order.
    pub budgets: Vec<BudgetView>,
}

impl ConnectionResponse {
    fn new(connection: Connection, now: UnixSeconds) -> Self {
        let status = connection.status(now);
        Self {
            budgets: connection.budgets.iter().map(BudgetView::from).collect(),
            data: ConnectionData {
                pubkey: connection.pubkey.to_hex(),
                description: connection.description,
                permissions: connection.permissions,
                expires_at: connection.expires_at,
                created_at: connection.created_at,
                last_used: connection.last_used,
                status,
            },
        }
    }
}

/// Acknowledgement of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// Administrative operations over the engine.
#[derive(Debug, Clone)]
pub struct NwcApi {
    service: AuthorizationService,
    settings: SettingsStore,
}

impl NwcApi {
    /// Create the API over a service and settings store.
    #[must_use]
    pub fn new(service: AuthorizationService, settings: SettingsStore) -> Self {
        Self { service, settings }
    }

    /// The authorization service.
    #[must_use]
    pub fn service(&self) -> &AuthorizationService {
        &self.service
    }

    /// The settings store.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The permission catalog, in order.
    #[must_use]
    pub fn permissions(&self) -> Vec<PermissionView> {
        self.service
            .registry()
            .catalog()
            .list()
            .iter()
            .map(PermissionView::from)
            .collect()
    }

    /// Every connection with its budgets.
    ///
    /// # Errors
    ///
    /// Registry failures.
    pub async fn list_connections(
        &self,
        include_expired: bool,
        calculate_spent_budget: bool,
    ) -> AuthorizationResult<Vec<ConnectionResponse>> {
        let registry = self.service.registry();
        let now = registry.now();
        Ok(registry
            .list(include_expired, calculate_spent_budget)
            .await?
            .into_iter()
            .map(|conn| ConnectionResponse::new(conn, now))
            .collect())
    }

    /// One connection.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::Registry`] wrapping `NotFound` or `InvalidInput`.
    pub async fn get_connection(
        &self,
        pubkey: &str,
        include_expired: bool,
    ) -> AuthorizationResult<ConnectionResponse> {
        let pubkey = parse_pubkey(pubkey)?;
        let registry = self.service.registry();
        let conn = registry.get_view(&pubkey, include_expired).await?;
        Ok(ConnectionResponse::new(conn, registry.now()))
    }

    /// Register a connection for `pubkey`.
    ///
    /// # Errors
    ///
    /// The creation errors of the registry.
    pub async fn register(
        &self,
        pubkey: &str,
        request: RegistrationRequest,
    ) -> AuthorizationResult<ConnectionResponse> {
        let registry = self.service.registry();
        let conn = registry
            .create(NewConnection {
                pubkey: pubkey.to_string(),
                description: request.description,
                permissions: request.permissions,
                expires_at: request.expires_at,
                budgets: request.budgets,
            })
            .await?;
        Ok(ConnectionResponse::new(conn, registry.now()))
    }

    /// Delete the connection for `pubkey`.
    ///
    /// Confirmation is the caller's business; this is the single
    /// irreversible step.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::Registry`] wrapping `NotFound`.
    pub async fn delete(&self, pubkey: &str) -> AuthorizationResult<DeleteResponse> {
        let key = parse_pubkey(pubkey)?;
        self.service.registry().delete(&key).await?;
        Ok(DeleteResponse {
            message: format!("NWC key {} deleted successfully.", key.to_hex()),
        })
    }

    /// The pairing template for new connections.
    ///
    /// The caller substitutes its own secret locally with
    /// [`build_pairing_credential`](nwc_crypto::build_pairing_credential);
    /// the secret never reaches this side.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::MissingSetting`] before settings are seeded, and
    /// [`AuthorizationError::Crypto`] if the relay cannot be resolved.
    pub async fn pairing_template(
        &self,
        origin: Option<&RequestOrigin>,
    ) -> AuthorizationResult<PairingTemplate> {
        let provider = self.settings.provider().await?;
        let relay = resolve_relay(&provider.relay, &provider.relay_alias, origin)?;
        let template = PairingTemplate::new(&provider.provider_pubkey()?, &relay)?;
        info!(relay = %relay, "pairing template issued");
        Ok(template)
    }

    /// The full settings map.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn get_config(&self) -> AuthorizationResult<BTreeMap<String, String>> {
        self.settings.get_all().await
    }

    /// A single setting, as a one-entry map with `None` when unset.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn get_config_key(
        &self,
        key: &str,
    ) -> AuthorizationResult<BTreeMap<String, Option<String>>> {
        let value = self.settings.get(key).await?;
        Ok(BTreeMap::from([(key.to_string(), value)]))
    }

    /// Write several settings and return the resulting map.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::InvalidSetting`] if any value is rejected; in
    /// that case nothing is written.
    pub async fn set_config(
        &self,
        values: &BTreeMap<String, String>,
    ) -> AuthorizationResult<BTreeMap<String, String>> {
        self.settings.set_many(values).await?;
        self.settings.get_all().await
    }
}

fn parse_pubkey(pubkey: &str) -> AuthorizationResult<PublicKey> {
    validate_pubkey_hex(pubkey)?;
    PublicKey::from_hex(pubkey).map_err(AuthorizationError::from)
}
