//! Provider settings map.
//!
//! Settings are an opaque string-to-string map persisted in the store. The
//! handful of keys the engine reads are enumerated in [`SettingKey`] and
//! validated on write; any other key is stored verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use nwc_core::hardening::is_printable;
use nwc_crypto::{IdentityProvider, KeyPair, PublicKey};
use nwc_storage::KvStore;
use tracing::info;
use zeroize::Zeroizing;

use crate::error::{AuthorizationError, AuthorizationResult};

/// Storage namespace for settings.
pub const NS_CONFIG: &str = "nwc:config";

/// Relay keyword that expands to the host's own relay endpoint.
pub const DEFAULT_RELAY: &str = "nostrclient";

const MAX_SETTING_LEN: usize = 4096;

/// Settings with meaning to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Relay URL, or `nostrclient` for the local relay.
    Relay,
    /// Public relay URL advertised instead of `relay` when non-empty.
    RelayAlias,
    /// Hex secret of the provider identity.
    ProviderKey,
}

impl SettingKey {
    /// Every known key.
    pub const ALL: [Self; 3] = [Self::Relay, Self::RelayAlias, Self::ProviderKey];

    /// Storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::RelayAlias => "relay_alias",
            Self::ProviderKey => "provider_key",
        }
    }

    fn validate(self, value: &str) -> Result<(), String> {
        match self {
            Self::Relay if value.trim().is_empty() => Err("relay must not be empty".to_string()),
            Self::Relay | Self::RelayAlias => Ok(()),
            Self::ProviderKey => KeyPair::from_secret_hex(value)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("not a known setting: {s}"))
    }
}

/// Typed view of the settings the pairing flow needs.
pub struct ProviderSettings {
    /// Configured relay.
    pub relay: String,
    /// Advertised relay override.
    pub relay_alias: String,
    provider_key: Zeroizing<String>,
}

impl ProviderSettings {
    /// The provider key pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Crypto`] if the stored secret is malformed.
    pub fn keypair(&self) -> AuthorizationResult<KeyPair> {
        Ok(KeyPair::from_secret_hex(&self.provider_key)?)
    }

    /// The provider public key.
    ///
    /// # Errors
    ///
    /// See [`keypair`](Self::keypair).
    pub fn provider_pubkey(&self) -> AuthorizationResult<PublicKey> {
        Ok(self.keypair()?.public_key())
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("relay", &self.relay)
            .field("relay_alias", &self.relay_alias)
            .field("provider_key", &"<redacted>")
            .finish()
    }
}

/// Settings persisted in a [`KvStore`].
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KvStore>,
}

impl SettingsStore {
    /// Create a settings store over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Write defaults for absent keys; present values are never overwritten.
    ///
    /// A missing provider key is generated from `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Storage`] on store failure and
    /// [`AuthorizationError::Crypto`] if no identity can be generated.
    pub async fn seed_defaults(
        &self,
        identity: &IdentityProvider,
        relay: &str,
    ) -> AuthorizationResult<()> {
        if self.get(SettingKey::Relay.as_str()).await?.is_none() {
            self.write(SettingKey::Relay.as_str(), relay).await?;
        }
        if self.get(SettingKey::RelayAlias.as_str()).await?.is_none() {
            self.write(SettingKey::RelayAlias.as_str(), "").await?;
        }
        if self.get(SettingKey::ProviderKey.as_str()).await?.is_none() {
            let keypair = identity.generate_identity().await?;
            self.write(SettingKey::ProviderKey.as_str(), &keypair.secret_hex())
                .await?;
            info!(provider = %keypair.public_key().key_id_hex(), "provider identity generated");
        }
        Ok(())
    }

    /// One setting.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Storage`] on store failure.
    pub async fn get(&self, key: &str) -> AuthorizationResult<Option<String>> {
        let Some(bytes) = self.store.get(NS_CONFIG, key).await? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| AuthorizationError::Internal(format!("setting {key} is not utf-8")))
    }

    /// Every setting, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Storage`] on store failure.
    pub async fn get_all(&self) -> AuthorizationResult<BTreeMap<String, String>> {
        let mut all = BTreeMap::new();
        for key in self.store.list_keys(NS_CONFIG).await? {
            if let Some(value) = self.get(&key).await? {
                all.insert(key, value);
            }
        }
        Ok(all)
    }

    /// Set one setting, validating known keys.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::InvalidSetting`] for a rejected value.
    pub async fn set(&self, key: &str, value: &str) -> AuthorizationResult<()> {
        validate_setting(key, value)?;
        self.write(key, value).await
    }

    /// Set several settings. All values are validated before any is written.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_many(&self, values: &BTreeMap<String, String>) -> AuthorizationResult<()> {
        for (key, value) in values {
            validate_setting(key, value)?;
        }
        for (key, value) in values {
            self.write(key, value).await?;
        }
        Ok(())
    }

    /// The typed provider view.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::MissingSetting`] if the provider key or
    /// relay has not been seeded.
    pub async fn provider(&self) -> AuthorizationResult<ProviderSettings> {
        let relay = self
            .get(SettingKey::Relay.as_str())
            .await?
            .ok_or_else(|| AuthorizationError::MissingSetting(SettingKey::Relay.to_string()))?;
        let relay_alias = self
            .get(SettingKey::RelayAlias.as_str())
            .await?
            .unwrap_or_default();
        let provider_key = self
            .get(SettingKey::ProviderKey.as_str())
            .await?
            .ok_or_else(|| {
                AuthorizationError::MissingSetting(SettingKey::ProviderKey.to_string())
            })?;
        Ok(ProviderSettings {
            relay,
            relay_alias,
            provider_key: Zeroizing::new(provider_key),
        })
    }

    async fn write(&self, key: &str, value: &str) -> AuthorizationResult<()> {
        self.store
            .set(NS_CONFIG, key, value.as_bytes().to_vec())
            .await?;
        Ok(())
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

fn validate_setting(key: &str, value: &str) -> AuthorizationResult<()> {
    let invalid = |reason: String| AuthorizationError::InvalidSetting {
        key: key.to_string(),
        reason,
    };
    if key.trim().is_empty() || !is_printable(key) {
        return Err(invalid("key must be printable and non-empty".to_string()));
    }
    if !is_printable(value) || value.len() > MAX_SETTING_LEN {
        return Err(invalid("value must be printable and short".to_string()));
    }
    if let Ok(known) = key.parse::<SettingKey>() {
        known.validate(value).map_err(invalid)?;
    }
    Ok(())
}
