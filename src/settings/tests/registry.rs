//! Registry behavior against an in-memory provider: instance deduplication,
//! binding lifecycle and change fan-out.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{sync::mpsc, time::timeout};
use toml::{Value, map::Map};

use crate::settings::{
    BinderId, ChangeCallback, DocumentStore, SettingsError, SettingsRegistry, SettingsStore,
    StoreId, StoreProvider,
};

const EVENT_WAIT: Duration = Duration::from_secs(2);
const QUIET_WAIT: Duration = Duration::from_millis(150);

/// Provider over a fixed set of in-memory stores, counting create calls.
struct TestProvider {
    stores: Mutex<HashMap<StoreId, Arc<DocumentStore>>>,
    create_calls: AtomicUsize,
}

impl TestProvider {
    fn new(stores: Vec<(StoreId, Vec<(&str, Value)>)>) -> Self {
        let stores = stores
            .into_iter()
            .map(|(id, entries)| {
                let mut table = Map::new();
                for (key, value) in entries {
                    table.insert(key.to_string(), value);
                }
                (id, Arc::new(DocumentStore::in_memory(table)))
            })
            .collect();

        Self {
            stores: Mutex::new(stores),
            create_calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl StoreProvider for TestProvider {
    fn create(&self, id: &StoreId) -> Option<Arc<dyn SettingsStore>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.stores
            .lock()
            .unwrap()
            .get(id)
            .map(|store| store.clone() as Arc<dyn SettingsStore>)
    }
}

/// Provider that always fails creation.
struct FailingProvider;

impl StoreProvider for FailingProvider {
    fn create(&self, _id: &StoreId) -> Option<Arc<dyn SettingsStore>> {
        None
    }
}

type Invocation = (String, Value, BinderId);

fn recording_callback() -> (ChangeCallback, mpsc::UnboundedReceiver<Invocation>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ChangeCallback = Arc::new(move |key, value, binder| {
        let _ = tx.send((key.to_string(), value.clone(), binder));
    });
    (callback, rx)
}

fn dock_id() -> StoreId {
    StoreId::new("org.wharf.dock", "appearance", "")
}

fn tray_id() -> StoreId {
    StoreId::new("org.wharf.dock", "tray", "")
}

fn dock_registry() -> (Arc<TestProvider>, SettingsRegistry) {
    let provider = Arc::new(TestProvider::new(vec![
        (
            dock_id(),
            vec![
                ("icon-size", Value::Integer(48)),
                ("show-labels", Value::Boolean(false)),
            ],
        ),
        (tray_id(), vec![("spacing", Value::Integer(4))]),
    ]));
    let registry = SettingsRegistry::new(provider.clone());
    (provider, registry)
}

async fn expect_event(rx: &mut mpsc::UnboundedReceiver<Invocation>) -> Invocation {
    timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("timed out waiting for change event")
        .expect("callback channel closed")
}

async fn expect_quiet(rx: &mut mpsc::UnboundedReceiver<Invocation>) {
    tokio::time::sleep(QUIET_WAIT).await;
    assert!(rx.try_recv().is_err(), "unexpected change event");
}

#[tokio::test]
async fn same_id_resolves_to_identical_instance() {
    let (provider, registry) = dock_registry();

    let first = registry.store(&dock_id()).await.unwrap();
    let second = registry.store(&dock_id()).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn get_returns_live_value_or_default() {
    let (_, registry) = dock_registry();

    let live = registry
        .get(&dock_id(), "icon-size", Value::Integer(0))
        .await;
    assert_eq!(live, Value::Integer(48));

    let default = registry
        .get(&dock_id(), "no-such-key", Value::String("fallback".to_string()))
        .await;
    assert_eq!(default, Value::String("fallback".to_string()));
}

#[tokio::test]
async fn set_fires_bound_callback_with_new_value() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, mut rx) = recording_callback();

    let _binding = registry
        .bind(&dock_id(), binder, "icon-size", callback)
        .await
        .unwrap();

    registry.set(&dock_id(), "icon-size", Value::Integer(64)).await;

    let (key, value, fired_binder) = expect_event(&mut rx).await;
    assert_eq!(key, "icon-size");
    assert_eq!(value, Value::Integer(64));
    assert_eq!(fired_binder, binder);
}

#[tokio::test]
async fn double_bind_fires_once_per_change() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, mut rx) = recording_callback();

    let _first = registry
        .bind(&dock_id(), binder, "icon-size", callback.clone())
        .await
        .unwrap();
    let _second = registry
        .bind(&dock_id(), binder, "icon-size", callback)
        .await
        .unwrap();

    registry.set(&dock_id(), "icon-size", Value::Integer(32)).await;

    let (key, _, _) = expect_event(&mut rx).await;
    assert_eq!(key, "icon-size");
    expect_quiet(&mut rx).await;
}

#[tokio::test]
async fn unbound_callback_never_fires() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, mut rx) = recording_callback();

    let binding = registry
        .bind(&dock_id(), binder, "icon-size", callback)
        .await
        .unwrap();
    std::mem::forget(binding);

    registry.unbind(binder).await;
    registry.set(&dock_id(), "icon-size", Value::Integer(16)).await;

    expect_quiet(&mut rx).await;
}

#[tokio::test]
async fn unbind_spans_every_store() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, mut rx) = recording_callback();

    let dock_binding = registry
        .bind(&dock_id(), binder, "icon-size", callback.clone())
        .await
        .unwrap();
    let tray_binding = registry
        .bind(&tray_id(), binder, "spacing", callback)
        .await
        .unwrap();
    std::mem::forget(dock_binding);
    std::mem::forget(tray_binding);

    registry.unbind(binder).await;

    registry.set(&dock_id(), "icon-size", Value::Integer(24)).await;
    registry.set(&tray_id(), "spacing", Value::Integer(8)).await;

    expect_quiet(&mut rx).await;
}

#[tokio::test]
async fn key_scoped_unbind_keeps_remaining_binding_alive() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, mut rx) = recording_callback();

    let dock_binding = registry
        .bind(&dock_id(), binder, "icon-size", callback.clone())
        .await
        .unwrap();
    let _tray_binding = registry
        .bind(&tray_id(), binder, "spacing", callback)
        .await
        .unwrap();
    std::mem::forget(dock_binding);

    registry.unbind_key(binder, "icon-size").await;

    registry.set(&dock_id(), "icon-size", Value::Integer(56)).await;
    registry.set(&tray_id(), "spacing", Value::Integer(12)).await;

    let (key, value, _) = expect_event(&mut rx).await;
    assert_eq!(key, "spacing");
    assert_eq!(value, Value::Integer(12));
    expect_quiet(&mut rx).await;
}

#[tokio::test]
async fn rebinding_overwrites_the_callback_slot() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (old_callback, mut old_rx) = recording_callback();
    let (new_callback, mut new_rx) = recording_callback();

    let _icon = registry
        .bind(&dock_id(), binder, "icon-size", old_callback)
        .await
        .unwrap();
    let _labels = registry
        .bind(&dock_id(), binder, "show-labels", new_callback)
        .await
        .unwrap();

    registry.set(&dock_id(), "icon-size", Value::Integer(40)).await;

    let (key, _, _) = expect_event(&mut new_rx).await;
    assert_eq!(key, "icon-size");
    expect_quiet(&mut old_rx).await;
}

#[tokio::test]
async fn dropping_binding_guard_releases_the_key() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, mut rx) = recording_callback();

    let binding = registry
        .bind(&dock_id(), binder, "icon-size", callback)
        .await
        .unwrap();
    drop(binding);

    registry.set(&dock_id(), "icon-size", Value::Integer(20)).await;

    expect_quiet(&mut rx).await;
}

#[tokio::test]
async fn malformed_encoded_path_touches_nothing() {
    let (provider, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, _rx) = recording_callback();

    for encoded in ["a,b", "a,b,c,d"] {
        let value = registry
            .get_encoded(encoded, "icon-size", Value::Integer(7))
            .await;
        assert_eq!(value, Value::Integer(7));

        let result = registry
            .bind_encoded(encoded, binder, "icon-size", callback.clone())
            .await;
        assert!(matches!(result, Err(SettingsError::MalformedPath { .. })));

        registry.set_encoded(encoded, "icon-size", Value::Integer(1)).await;
    }

    // A well-formed encoded path still resolves.
    let value = registry
        .get_encoded("org.wharf.dock,appearance,", "icon-size", Value::Integer(0))
        .await;
    assert_eq!(value, Value::Integer(48));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn provider_failure_degrades_to_defaults() {
    let registry = SettingsRegistry::new(Arc::new(FailingProvider));
    let binder = registry.next_binder();
    let (callback, _rx) = recording_callback();
    let id = StoreId::new("missing", "store", "");

    assert!(registry.store(&id).await.is_none());

    let value = registry.get(&id, "anything", Value::Boolean(true)).await;
    assert_eq!(value, Value::Boolean(true));

    let result = registry.bind(&id, binder, "anything", callback).await;
    assert!(matches!(result, Err(SettingsError::StoreUnavailable { .. })));

    registry.set(&id, "anything", Value::Integer(1)).await;
}

#[tokio::test]
async fn set_of_undeclared_key_is_a_noop() {
    let (_, registry) = dock_registry();

    registry
        .set(&dock_id(), "not-declared", Value::Integer(1))
        .await;

    let value = registry
        .get(&dock_id(), "not-declared", Value::Integer(0))
        .await;
    assert_eq!(value, Value::Integer(0));
}

#[tokio::test]
async fn shutdown_degrades_later_operations() {
    let (_, registry) = dock_registry();
    let binder = registry.next_binder();
    let (callback, _rx) = recording_callback();

    registry.shutdown().await;

    let value = registry
        .get(&dock_id(), "icon-size", Value::Integer(5))
        .await;
    assert_eq!(value, Value::Integer(5));

    assert!(registry.store(&dock_id()).await.is_none());

    let result = registry.bind(&dock_id(), binder, "icon-size", callback).await;
    assert!(matches!(result, Err(SettingsError::RegistryClosed)));
}
