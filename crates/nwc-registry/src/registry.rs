//! The connection registry.
//!
//! The map of live connections is only ever locked for in-memory work.
//! `create` and `delete` first reserve the pubkey in a pending set, then do
//! their storage I/O with no registry-wide lock held, and finally publish or
//! withdraw the entry under a short write lock. Readers therefore see a
//! connection either fully present or fully absent, and spends on other
//! connections never wait on another connection's disk write. The budget
//! arithmetic itself runs under each connection's own ledger lock.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use nwc_budget::{Budget, BudgetLedger, Decision, LedgerError, LedgerSnapshot};
use nwc_core::hardening::{
    DEFAULT_MAX_DESCRIPTION_LEN, validate_description, validate_expires_at, validate_pubkey_hex,
};
use nwc_core::{Clock, ConnectionStatus, Msats, PermissionCatalog, UnixSeconds};
use nwc_crypto::PublicKey;
use nwc_storage::KvStore;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::connection::{Connection, NewConnection};
use crate::error::{RegistryError, RegistryResult};

/// Storage namespace holding one record per connection, keyed by pubkey hex.
pub const NS_CONNECTIONS: &str = "nwc:connections";

/// Edge limits applied at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Longest accepted description, in characters.
    pub max_description_len: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
        }
    }
}

#[derive(Debug)]
struct ConnectionCell {
    pubkey: PublicKey,
    description: String,
    permissions: Vec<String>,
    expires_at: UnixSeconds,
    created_at: UnixSeconds,
    seq: u64,
    ledger: BudgetLedger,
    /// Highest ledger revision written to the store.
    persisted: Mutex<u64>,
    cancel: CancellationToken,
    sessions: TaskTracker,
}

impl ConnectionCell {
    fn from_record(record: Connection, seq: u64) -> Self {
        Self {
            pubkey: record.pubkey,
            description: record.description,
            permissions: record.permissions,
            expires_at: record.expires_at,
            created_at: record.created_at,
            seq,
            ledger: BudgetLedger::new(record.budgets, record.last_used),
            persisted: Mutex::new(0),
            cancel: CancellationToken::new(),
            sessions: TaskTracker::new(),
        }
    }

    fn view(&self, budgets: Vec<Budget>, last_used: UnixSeconds) -> Connection {
        Connection {
            pubkey: self.pubkey,
            description: self.description.clone(),
            permissions: self.permissions.clone(),
            expires_at: self.expires_at,
            created_at: self.created_at,
            last_used,
            budgets,
        }
    }

    fn record(&self, snapshot: &LedgerSnapshot) -> Connection {
        self.view(snapshot.budgets.clone(), snapshot.last_used)
    }

    fn status(&self, now: UnixSeconds) -> ConnectionStatus {
        ConnectionStatus::evaluate(self.expires_at, now)
    }
}

/// A live reference to one registered connection.
///
/// Obtained from [`ConnectionRegistry::handle`]; stays valid (but inert)
/// after the connection is deleted.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    cell: Arc<ConnectionCell>,
}

impl ConnectionHandle {
    /// The connection's public key.
    #[must_use]
    pub fn pubkey(&self) -> PublicKey {
        self.cell.pubkey
    }

    /// Granted permission keys.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.cell.permissions
    }

    /// Expiry timestamp; `0` never expires.
    #[must_use]
    pub fn expires_at(&self) -> UnixSeconds {
        self.cell.expires_at
    }

    /// Lifecycle status at `now`.
    #[must_use]
    pub fn status(&self, now: UnixSeconds) -> ConnectionStatus {
        self.cell.status(now)
    }
}

/// Pubkeys with a `create` or `delete` in flight.
#[derive(Debug, Default)]
struct PendingKeys(StdMutex<HashSet<PublicKey>>);

impl PendingKeys {
    fn reserve(&self, pubkey: PublicKey) -> Option<Reservation<'_>> {
        let inserted = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pubkey);
        if !inserted {
            return None;
        }
        Some(Reservation {
            pending: self,
            pubkey,
        })
    }
}

/// Releases its pubkey when dropped, including when the owning future is.
struct Reservation<'a> {
    pending: &'a PendingKeys,
    pubkey: PublicKey,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.pending
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.pubkey);
    }
}

/// Owner of every paired connection.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<PublicKey, Arc<ConnectionCell>>>,
    pending: PendingKeys,
    store: Arc<dyn KvStore>,
    catalog: PermissionCatalog,
    clock: Arc<dyn Clock>,
    limits: RegistryLimits,
    next_seq: AtomicU64,
}

impl ConnectionRegistry {
    /// Open the registry, loading every persisted connection.
    ///
    /// Stored grants are taken as-is; a later catalog change does not
    /// invalidate them.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if the store cannot be read and
    /// [`RegistryError::Serialization`] for a corrupt record.
    pub async fn open(
        store: Arc<dyn KvStore>,
        catalog: PermissionCatalog,
        clock: Arc<dyn Clock>,
        limits: RegistryLimits,
    ) -> RegistryResult<Self> {
        let keys = store.list_keys(NS_CONNECTIONS).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(bytes) = store.get(NS_CONNECTIONS, &key).await? else {
                continue;
            };
            let record: Connection = serde_json::from_slice(&bytes)?;
            if record.pubkey.to_hex() != key {
                warn!(key = %key, "connection record stored under a foreign key");
            }
            records.push(record);
        }
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.pubkey.cmp(&b.pubkey))
        });

        let mut connections = HashMap::with_capacity(records.len());
        let mut seq: u64 = 0;
        for record in records {
            connections.insert(record.pubkey, Arc::new(ConnectionCell::from_record(record, seq)));
            seq = seq.saturating_add(1);
        }
        info!(count = connections.len(), "connection registry loaded");

        Ok(Self {
            connections: RwLock::new(connections),
            pending: PendingKeys::default(),
            store,
            catalog,
            clock,
            limits,
            next_seq: AtomicU64::new(seq),
        })
    }

    /// The permission catalog grants are validated against.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Current time according to the registry's clock.
    #[must_use]
    pub fn now(&self) -> UnixSeconds {
        self.clock.now()
    }

    /// Number of registered connections, expired ones included.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Register a new connection.
    ///
    /// Every budget starts a fresh period at the current time with nothing
    /// consumed.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidInput`] for a malformed pubkey, description or expiry
    /// - [`RegistryError::DuplicateConnection`] if the pubkey is taken or
    ///   another `create`/`delete` for it is in flight
    /// - [`RegistryError::UnknownPermission`] for a key outside the catalog
    /// - [`RegistryError::InvalidBudgetSpec`] for a negative or absurd budget
    /// - [`RegistryError::Storage`] if the record cannot be written; nothing is registered then
    pub async fn create(&self, request: NewConnection) -> RegistryResult<Connection> {
        validate_pubkey_hex(&request.pubkey)?;
        let pubkey =
            PublicKey::from_hex(&request.pubkey).map_err(|e| RegistryError::InvalidInput {
                field: "pubkey",
                reason: e.to_string(),
            })?;

        let reservation = {
            let connections = self.connections.read().await;
            if connections.contains_key(&pubkey) {
                return Err(RegistryError::DuplicateConnection(pubkey.to_hex()));
            }
            self.pending
                .reserve(pubkey)
                .ok_or_else(|| RegistryError::DuplicateConnection(pubkey.to_hex()))?
        };

        validate_description(&request.description, self.limits.max_description_len)?;
        validate_expires_at(request.expires_at)?;
        if let Some(unknown) = self
            .catalog
            .first_unknown(request.permissions.iter().map(String::as_str))
        {
            return Err(RegistryError::UnknownPermission(unknown.to_string()));
        }

        let now = self.clock.now();
        let mut permissions: Vec<String> = Vec::with_capacity(request.permissions.len());
        for key in request.permissions {
            if !permissions.contains(&key) {
                permissions.push(key);
            }
        }
        let budgets = request
            .budgets
            .into_iter()
            .enumerate()
            .map(|(index, spec)| spec.into_budget(index, now))
            .collect::<RegistryResult<Vec<_>>>()?;

        let record = Connection {
            pubkey,
            description: request.description,
            permissions,
            expires_at: request.expires_at,
            created_at: now,
            last_used: now,
            budgets,
        };
        self.write_record(&record).await?;

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let cell = Arc::new(ConnectionCell::from_record(record.clone(), seq));
        let mut connections = self.connections.write().await;
        connections.insert(pubkey, cell);
        drop(reservation);
        drop(connections);

        info!(
            pubkey = %pubkey.key_id_hex(),
            permissions = ?record.permissions,
            budgets = record.budgets.len(),
            expires_at = record.expires_at,
            "connection created"
        );
        Ok(record)
    }

    /// Look up a live handle for `pubkey`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no such connection exists.
    pub async fn handle(&self, pubkey: &PublicKey) -> RegistryResult<ConnectionHandle> {
        self.connections
            .read()
            .await
            .get(pubkey)
            .map(|cell| ConnectionHandle {
                cell: Arc::clone(cell),
            })
            .ok_or_else(|| RegistryError::NotFound(pubkey.to_hex()))
    }

    /// Whether `pubkey` is registered.
    pub async fn contains(&self, pubkey: &PublicKey) -> bool {
        self.connections.read().await.contains_key(pubkey)
    }

    /// The stored record for `pubkey`, expired or not.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no such connection exists.
    pub async fn get(&self, pubkey: &PublicKey) -> RegistryResult<Connection> {
        let handle = self.handle(pubkey).await?;
        let snapshot = handle.cell.ledger.snapshot().map_err(RegistryError::Ledger)?;
        Ok(handle.cell.record(&snapshot))
    }

    /// The record for `pubkey`, hiding expired connections unless asked.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent, or expired without `include_expired`.
    pub async fn get_view(
        &self,
        pubkey: &PublicKey,
        include_expired: bool,
    ) -> RegistryResult<Connection> {
        let connection = self.get(pubkey).await?;
        if !include_expired && !connection.status(self.clock.now()).is_active() {
            return Err(RegistryError::NotFound(pubkey.to_hex()));
        }
        Ok(connection)
    }

    /// All connections, oldest first.
    ///
    /// With `calculate_spent`, budgets are shown as they stand now, with any
    /// due rollover applied to the copy only; the ledger is not mutated.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Ledger`] if a ledger lock is poisoned.
    pub async fn list(
        &self,
        include_expired: bool,
        calculate_spent: bool,
    ) -> RegistryResult<Vec<Connection>> {
        let now = self.clock.now();
        let mut cells: Vec<Arc<ConnectionCell>> =
            self.connections.read().await.values().cloned().collect();
        cells.sort_by_key(|cell| (cell.created_at, cell.seq));

        cells
            .into_iter()
            .filter(|cell| include_expired || cell.status(now).is_active())
            .map(|cell| -> RegistryResult<Connection> {
                let snapshot = cell.ledger.snapshot().map_err(RegistryError::Ledger)?;
                let budgets = if calculate_spent {
                    cell.ledger.resolved(now).map_err(RegistryError::Ledger)?
                } else {
                    snapshot.budgets
                };
                Ok(cell.view(budgets, snapshot.last_used))
            })
            .collect()
    }

    /// Charge `amount` against the connection's budgets and persist the result.
    ///
    /// Only the authorization path should call this: it performs no status
    /// or permission checks of its own.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if the connection was deleted meanwhile,
    /// [`RegistryError::Storage`] if the new state could not be written. In
    /// the latter case the consumption stays counted in memory.
    pub async fn charge(
        &self,
        handle: &ConnectionHandle,
        amount: Msats,
        now: UnixSeconds,
    ) -> RegistryResult<Decision> {
        let cell = &handle.cell;
        let outcome = cell
            .ledger
            .authorize(amount, now)
            .map_err(|e| ledger_error(cell, e))?;
        if let Some(snapshot) = outcome.snapshot {
            self.persist(cell, &snapshot).await?;
        }
        Ok(outcome.decision)
    }

    /// Change the refresh window of one budget.
    ///
    /// Due rollovers under the old window are applied first; the resulting
    /// `window_start` and `used_msats` are kept.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for an unknown connection,
    /// [`RegistryError::InvalidBudgetSpec`] for a bad index or negative window,
    /// [`RegistryError::Storage`] if the change cannot be written.
    pub async fn reconfigure_budget(
        &self,
        pubkey: &PublicKey,
        index: usize,
        refresh_window: i64,
    ) -> RegistryResult<Connection> {
        let window =
            u64::try_from(refresh_window).map_err(|_| RegistryError::InvalidBudgetSpec {
                index,
                reason: "refresh_window must not be negative".to_string(),
            })?;
        let handle = self.handle(pubkey).await?;
        let cell = &handle.cell;
        let snapshot = cell
            .ledger
            .reconfigure(index, window, self.clock.now())
            .map_err(|e| match e {
                LedgerError::NoSuchBudget { .. } => RegistryError::InvalidBudgetSpec {
                    index,
                    reason: e.to_string(),
                },
                other => ledger_error(cell, other),
            })?;
        self.persist(cell, &snapshot).await?;

        info!(pubkey = %pubkey.key_id_hex(), index, refresh_window = window, "budget window changed");
        Ok(cell.record(&snapshot))
    }

    /// Spawn a transport session bound to the connection's lifetime.
    ///
    /// The session receives a token that is cancelled when the connection is
    /// deleted; [`delete`](Self::delete) waits for it to finish.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no such connection exists.
    pub async fn attach_session<F, Fut>(&self, pubkey: &PublicKey, session: F) -> RegistryResult<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = self.handle(pubkey).await?;
        let cell = &handle.cell;
        if cell.cancel.is_cancelled() {
            return Err(RegistryError::NotFound(pubkey.to_hex()));
        }
        cell.sessions.spawn(session(cell.cancel.child_token()));
        debug!(pubkey = %pubkey.key_id_hex(), "session attached");
        Ok(())
    }

    /// Delete a connection and its budgets, then cancel and join its sessions.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent or already being deleted,
    /// [`RegistryError::Storage`] if the record cannot be removed; the
    /// connection is put back and stays usable then.
    pub async fn delete(&self, pubkey: &PublicKey) -> RegistryResult<()> {
        let (cell, reservation) = {
            let mut connections = self.connections.write().await;
            let reservation = self
                .pending
                .reserve(*pubkey)
                .ok_or_else(|| RegistryError::NotFound(pubkey.to_hex()))?;
            let cell = connections
                .remove(pubkey)
                .ok_or_else(|| RegistryError::NotFound(pubkey.to_hex()))?;
            (cell, reservation)
        };

        if let Err(e) = self.remove_record(&cell).await {
            let mut connections = self.connections.write().await;
            connections.insert(*pubkey, Arc::clone(&cell));
            drop(reservation);
            drop(connections);
            warn!(pubkey = %pubkey.key_id_hex(), error = %e, "connection delete failed, restored");
            return Err(e);
        }
        drop(reservation);

        cell.cancel.cancel();
        cell.sessions.close();
        cell.sessions.wait().await;

        info!(pubkey = %pubkey.key_id_hex(), "connection deleted");
        Ok(())
    }

    /// Retire the ledger and drop the stored record. Waits for any in-flight
    /// ledger write of this connection; the ledger is reinstated on failure.
    async fn remove_record(&self, cell: &ConnectionCell) -> RegistryResult<()> {
        let _persist = cell.persisted.lock().await;
        cell.ledger.retire().map_err(RegistryError::Ledger)?;
        if let Err(e) = self.store.delete(NS_CONNECTIONS, &cell.pubkey.to_hex()).await {
            cell.ledger.reinstate().map_err(RegistryError::Ledger)?;
            return Err(e.into());
        }
        Ok(())
    }

    async fn persist(&self, cell: &ConnectionCell, snapshot: &LedgerSnapshot) -> RegistryResult<()> {
        let mut persisted = cell.persisted.lock().await;
        if cell.ledger.is_retired() || snapshot.revision <= *persisted {
            debug!(
                pubkey = %cell.pubkey.key_id_hex(),
                revision = snapshot.revision,
                "skipping stale ledger write"
            );
            return Ok(());
        }
        self.write_record(&cell.record(snapshot)).await?;
        *persisted = snapshot.revision;
        Ok(())
    }

    async fn write_record(&self, record: &Connection) -> RegistryResult<()> {
        let bytes = serde_json::to_vec(record)?;
        self.store
            .set(NS_CONNECTIONS, &record.pubkey.to_hex(), bytes)
            .await?;
        Ok(())
    }
}

fn ledger_error(cell: &ConnectionCell, err: LedgerError) -> RegistryError {
    match err {
        LedgerError::Retired => RegistryError::NotFound(cell.pubkey.to_hex()),
        other => RegistryError::Ledger(other),
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("catalog_entries", &self.catalog.list().len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
