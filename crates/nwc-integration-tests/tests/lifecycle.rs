//! Connection lifecycle: expiry, listing, deletion and session teardown.

#![allow(clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nwc_authz::{
    AuthorizationError, AuthorizationService, NwcApi, RegistrationRequest, SettingsStore,
};
use nwc_core::{ConnectionStatus, ManualClock, PermissionCatalog};
use nwc_registry::{ConnectionRegistry, NewConnection, RegistryError, RegistryLimits};
use nwc_storage::{KvStore, MemoryKvStore};
use nwc_test::{pay_budget_spec, pay_invoice_request, test_pubkey, test_pubkey_from};

const T0: i64 = 1_700_000_000;

async fn api() -> (NwcApi, Arc<ManualClock>) {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let registry = ConnectionRegistry::open(
        Arc::clone(&store),
        PermissionCatalog::standard(),
        clock.clone(),
        RegistryLimits::default(),
    )
    .await
    .unwrap();
    let api = NwcApi::new(
        AuthorizationService::new(Arc::new(registry)),
        SettingsStore::new(store),
    );
    (api, clock)
}

#[tokio::test]
async fn test_status_flips_exactly_at_expiry() {
    let (api, clock) = api().await;
    let pk = test_pubkey_from(2).to_hex();
    api.register(
        &pk,
        RegistrationRequest {
            permissions: vec!["get_info".to_string()],
            expires_at: T0 + 10,
            ..RegistrationRequest::default()
        },
    )
    .await
    .unwrap();

    clock.set(T0 + 9);
    let conn = api.get_connection(&pk, false).await.unwrap();
    assert_eq!(conn.data.status, ConnectionStatus::Active);

    clock.set(T0 + 10);
    assert!(api.get_connection(&pk, false).await.is_err());
    let conn = api.get_connection(&pk, true).await.unwrap();
    assert_eq!(conn.data.status, ConnectionStatus::Expired);

    assert!(api.list_connections(false, false).await.unwrap().is_empty());
    assert_eq!(api.list_connections(true, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_is_ordered_by_creation() {
    let (api, clock) = api().await;
    for seed in [5u8, 3, 4] {
        api.register(
            &test_pubkey_from(seed).to_hex(),
            RegistrationRequest {
                permissions: vec!["get_info".to_string()],
                ..RegistrationRequest::default()
            },
        )
        .await
        .unwrap();
        clock.advance(1);
    }

    let listed: Vec<String> = api
        .list_connections(true, false)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.data.pubkey)
        .collect();
    let expected: Vec<String> = [5u8, 3, 4]
        .into_iter()
        .map(|s| test_pubkey_from(s).to_hex())
        .collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_listing_with_spent_shows_rolled_over_budgets() {
    let (api, clock) = api().await;
    let pk = test_pubkey();
    api.service()
        .registry()
        .create(pay_invoice_request(&pk))
        .await
        .unwrap();
    api.service()
        .authorize(&pk, "pay_invoice", 25_000)
        .await
        .unwrap();

    clock.advance(86_400);
    let fresh = api.list_connections(true, true).await.unwrap();
    assert_eq!(fresh[0].budgets[0].used_msats, 0);
    assert_eq!(fresh[0].budgets[0].next_reset, Some(T0 + 2 * 86_400));

    let stale = api.list_connections(true, false).await.unwrap();
    assert_eq!(stale[0].budgets[0].used_msats, 25_000);
}

#[tokio::test]
async fn test_duplicate_and_unknown_permission_rejected() {
    let (api, _clock) = api().await;
    let pk = test_pubkey();
    api.service()
        .registry()
        .create(pay_invoice_request(&pk))
        .await
        .unwrap();

    let err = api
        .service()
        .registry()
        .create(pay_invoice_request(&pk))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateConnection(_)));

    let err = api
        .service()
        .registry()
        .create(NewConnection {
            permissions: vec!["steal_funds".to_string()],
            ..pay_invoice_request(&test_pubkey_from(7))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::UnknownPermission(p) if p == "steal_funds"));
}

#[tokio::test]
async fn test_delete_revokes_and_cancels_sessions() {
    let (api, _clock) = api().await;
    let pk = test_pubkey();
    api.service()
        .registry()
        .create(pay_invoice_request(&pk))
        .await
        .unwrap();

    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    api.service()
        .registry()
        .attach_session(&pk, move |token| async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap();

    let response = api.delete(&pk.to_hex()).await.unwrap();
    assert_eq!(
        response.message,
        format!("NWC key {} deleted successfully.", pk.to_hex())
    );
    assert!(finished.load(Ordering::SeqCst));

    let err = api
        .service()
        .authorize(&pk, "pay_invoice", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorizationError::UnknownConnection(_)));

    assert!(api.delete(&pk.to_hex()).await.is_err());
    assert!(
        api.service()
            .registry()
            .attach_session(&pk, |_token| async {})
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_recreated_connection_starts_fresh() {
    let (api, clock) = api().await;
    let pk = test_pubkey();
    let registry = api.service().registry();
    registry.create(pay_invoice_request(&pk)).await.unwrap();
    api.service()
        .authorize(&pk, "pay_invoice", 90_000)
        .await
        .unwrap();
    registry.delete(&pk).await.unwrap();

    clock.advance(5);
    let conn = registry
        .create(NewConnection {
            budgets: vec![pay_budget_spec()],
            ..pay_invoice_request(&pk)
        })
        .await
        .unwrap();
    assert_eq!(conn.budgets[0].used_msats, 0);
    assert_eq!(conn.created_at, T0 + 5);
    assert!(
        api.service()
            .authorize(&pk, "pay_invoice", 90_000)
            .await
            .unwrap()
            .is_allowed()
    );
}
