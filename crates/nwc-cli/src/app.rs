//! Wiring of the engine over the on-disk store.

use std::sync::Arc;

use anyhow::Context;
use nwc_authz::{AuthorizationService, NwcApi, SettingKey, SettingsStore};
use nwc_config::ResolvedConfig;
use nwc_core::{PermissionCatalog, SystemClock};
use nwc_crypto::IdentityProvider;
use nwc_registry::ConnectionRegistry;
use nwc_storage::{FileKvStore, KvStore};
use tracing::debug;

use crate::config_bridge::to_registry_limits;

/// Open the store under the configured data directory, load every
/// connection and seed missing provider settings.
pub(crate) async fn open(resolved: &ResolvedConfig) -> anyhow::Result<NwcApi> {
    let data_dir = resolved.data_dir();
    let store: Arc<dyn KvStore> = Arc::new(
        FileKvStore::open(&data_dir)
            .await
            .with_context(|| format!("opening store at {}", data_dir.display()))?,
    );

    let registry = ConnectionRegistry::open(
        Arc::clone(&store),
        PermissionCatalog::default(),
        Arc::new(SystemClock),
        to_registry_limits(&resolved.config),
    )
    .await
    .context("loading connections")?;
    debug!(connections = registry.len().await, "registry loaded");

    let settings = SettingsStore::new(store);
    settings
        .seed_defaults(&IdentityProvider::new(), &resolved.config.provider.relay)
        .await
        .context("seeding provider settings")?;
    let alias = resolved.config.provider.relay_alias.trim();
    let stored_alias = settings.get(SettingKey::RelayAlias.as_str()).await?;
    if !alias.is_empty() && stored_alias.as_deref() == Some("") {
        settings
            .set(SettingKey::RelayAlias.as_str(), alias)
            .await
            .context("seeding relay alias")?;
    }

    Ok(NwcApi::new(
        AuthorizationService::new(Arc::new(registry)),
        settings,
    ))
}
