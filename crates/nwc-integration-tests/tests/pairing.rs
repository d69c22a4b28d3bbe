//! Provider settings and pairing credentials.

use std::collections::BTreeMap;
use std::sync::Arc;

use nwc_authz::{
    AuthorizationError, AuthorizationService, NwcApi, RegistrationRequest, SettingsStore,
};
use nwc_core::{ManualClock, PermissionCatalog};
use nwc_crypto::{
    IdentityProvider, KeyPair, PAIRING_SCHEME, PublicKey, RequestOrigin, SECRET_PLACEHOLDER,
    build_pairing_credential,
};
use nwc_registry::{ConnectionRegistry, RegistryLimits};
use nwc_storage::{KvStore, MemoryKvStore};
use nwc_telemetry::{RequestContext, RequestGuard};

async fn api() -> NwcApi {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let registry = ConnectionRegistry::open(
        Arc::clone(&store),
        PermissionCatalog::standard(),
        Arc::new(ManualClock::new(1_700_000_000)),
        RegistryLimits::default(),
    )
    .await
    .unwrap();
    NwcApi::new(
        AuthorizationService::new(Arc::new(registry)),
        SettingsStore::new(store),
    )
}

#[tokio::test]
async fn test_template_requires_seeded_settings() {
    let api = api().await;
    let err = api.pairing_template(None).await.unwrap_err();
    assert!(matches!(err, AuthorizationError::MissingSetting(_)));
}

#[tokio::test]
async fn test_client_pairing_flow() {
    let api = api().await;
    api.settings()
        .seed_defaults(&IdentityProvider::new(), "nostrclient")
        .await
        .unwrap();
    let provider = api.settings().provider().await.unwrap().provider_pubkey().unwrap();

    let origin = RequestOrigin::new("https", "wallet.example");
    let template = api.pairing_template(Some(&origin)).await.unwrap();
    assert!(template.as_str().starts_with(PAIRING_SCHEME));
    assert!(template.as_str().contains(&provider.to_hex()));
    assert!(template.as_str().contains(SECRET_PLACEHOLDER));

    // The client generates and keeps its own secret.
    let client = IdentityProvider::new().generate_identity().await.unwrap();
    let _guard = RequestGuard::new(
        RequestContext::new("pairing-test").with_connection(client.public_key().to_hex()),
    );
    api.register(
        &client.public_key().to_hex(),
        RegistrationRequest {
            permissions: vec!["get_info".to_string()],
            ..RegistrationRequest::default()
        },
    )
    .await
    .unwrap();

    let credential = build_pairing_credential(template.as_str(), &client.secret_hex()).unwrap();
    assert!(credential.contains(client.secret_hex().as_str()));
    assert!(!credential.contains(SECRET_PLACEHOLDER));

    let roundtrip = KeyPair::from_secret_hex(&client.secret_hex()).unwrap();
    assert_eq!(roundtrip.public_key(), client.public_key());
    assert!(
        api.service()
            .authorize(&client.public_key(), "get_info", 0)
            .await
            .unwrap()
            .is_allowed()
    );
}

/// What a wallet-connect client does with a pairing URL: read the secret and
/// derive its BIP340 x-only public key.
fn client_side_pubkey(credential: &str) -> PublicKey {
    let secret = credential
        .split("secret=")
        .nth(1)
        .map(|rest| rest.split('&').next().unwrap_or(rest))
        .unwrap();
    let secret = hex::decode(secret).unwrap();
    let signing_key = k256::schnorr::SigningKey::from_bytes(&secret).unwrap();
    PublicKey::from_bytes(signing_key.verifying_key().to_bytes().into())
}

#[tokio::test]
async fn test_paired_client_reaches_its_connection() {
    let api = api().await;
    api.settings()
        .seed_defaults(&IdentityProvider::new(), "wss://relay.example")
        .await
        .unwrap();
    let template = api.pairing_template(None).await.unwrap();

    let client = IdentityProvider::new().generate_identity().await.unwrap();
    api.register(
        &client.public_key().to_hex(),
        RegistrationRequest {
            permissions: vec!["get_balance".to_string()],
            ..RegistrationRequest::default()
        },
    )
    .await
    .unwrap();
    let credential = build_pairing_credential(template.as_str(), &client.secret_hex()).unwrap();

    let derived = client_side_pubkey(&credential);
    assert_eq!(derived, client.public_key());
    assert!(
        api.service()
            .authorize(&derived, "get_balance", 0)
            .await
            .unwrap()
            .is_allowed()
    );

    // The provider key in the template is the x-only key of the stored secret.
    let provider_key = api.settings().get("provider_key").await.unwrap().unwrap();
    let provider_secret = hex::decode(provider_key).unwrap();
    let provider_derived = k256::schnorr::SigningKey::from_bytes(&provider_secret).unwrap();
    let provider_hex = hex::encode(provider_derived.verifying_key().to_bytes());
    assert!(
        template
            .as_str()
            .starts_with(&format!("{PAIRING_SCHEME}{provider_hex}?"))
    );
}

#[tokio::test]
async fn test_relay_alias_overrides_local_relay() {
    let api = api().await;
    api.settings()
        .seed_defaults(&IdentityProvider::new(), "nostrclient")
        .await
        .unwrap();
    api.set_config(&BTreeMap::from([(
        "relay_alias".to_string(),
        "wss://relay.example".to_string(),
    )]))
    .await
    .unwrap();

    let template = api.pairing_template(None).await.unwrap();
    assert!(template.as_str().contains("relay=wss%3A%2F%2Frelay.example&"));
}

#[tokio::test]
async fn test_invalid_setting_writes_nothing() {
    let api = api().await;
    api.settings()
        .seed_defaults(&IdentityProvider::new(), "nostrclient")
        .await
        .unwrap();
    let before = api.get_config().await.unwrap();

    let err = api
        .set_config(&BTreeMap::from([
            ("relay".to_string(), "wss://ok.example".to_string()),
            ("provider_key".to_string(), "not-hex".to_string()),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorizationError::InvalidSetting { .. }));
    assert_eq!(api.get_config().await.unwrap(), before);
}
