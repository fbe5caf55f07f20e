//! Unit tests for the settings module.
//! In-memory stores only; filesystem coverage lives in the integration suite.

#![allow(clippy::unwrap_used)]

mod registry;

use toml::{Value, map::Map};

use crate::settings::{DocumentStore, SettingsError, SettingsStore, StoreId};

#[test]
fn store_id_parses_encoded_form() {
    let id = StoreId::parse_encoded("org.wharf.dock,appearance,dark").unwrap();

    assert_eq!(id.app_id, "org.wharf.dock");
    assert_eq!(id.name, "appearance");
    assert_eq!(id.subpath, "dark");
}

#[test]
fn store_id_allows_empty_subpath() {
    let id = StoreId::parse_encoded("org.wharf.dock,appearance,").unwrap();

    assert_eq!(id.subpath, "");
    assert_eq!(id, StoreId::new("org.wharf.dock", "appearance", ""));
}

#[test]
fn store_id_rejects_wrong_segment_counts() {
    for encoded in ["a,b", "a,b,c,d", "", "a"] {
        let result = StoreId::parse_encoded(encoded);
        assert!(
            matches!(result, Err(SettingsError::MalformedPath { .. })),
            "expected malformed path for {encoded:?}"
        );
    }
}

#[test]
fn store_id_is_structured_not_concatenated() {
    // "ab" + "c" and "a" + "bc" concatenate identically but are distinct ids.
    let left = StoreId::new("ab", "c", "");
    let right = StoreId::new("a", "bc", "");

    assert_ne!(left, right);
}

#[test]
fn store_id_display_matches_encoded_form() {
    let id = StoreId::new("app", "name", "sub");
    assert_eq!(id.to_string(), "app,name,sub");

    let reparsed = StoreId::parse_encoded(&id.to_string()).unwrap();
    assert_eq!(reparsed, id);
}

fn sample_document() -> Map<String, Value> {
    let mut table = Map::new();
    table.insert("icon-size".to_string(), Value::Integer(48));
    table.insert("show-labels".to_string(), Value::Boolean(false));
    table
}

#[test]
fn document_store_reads_declared_keys() {
    let store = DocumentStore::in_memory(sample_document());

    let mut keys = store.key_list();
    keys.sort();
    assert_eq!(keys, vec!["icon-size", "show-labels"]);

    assert_eq!(store.value("icon-size"), Some(Value::Integer(48)));
    assert_eq!(store.value("missing"), None);
}

#[test]
fn document_store_write_updates_value() {
    let store = DocumentStore::in_memory(sample_document());

    store
        .set_value("icon-size", Value::Integer(64))
        .unwrap();

    assert_eq!(store.value("icon-size"), Some(Value::Integer(64)));
}

#[tokio::test]
async fn document_store_broadcasts_changed_key() {
    let store = DocumentStore::in_memory(sample_document());
    let mut receiver = store.subscribe();

    store
        .set_value("show-labels", Value::Boolean(true))
        .unwrap();

    assert_eq!(receiver.recv().await.unwrap(), "show-labels");
}

#[tokio::test]
async fn document_store_change_stream_yields_keys() {
    use tokio_stream::StreamExt;

    let store = DocumentStore::in_memory(sample_document());
    let mut changes = store.changes();

    store
        .set_value("icon-size", Value::Integer(32))
        .unwrap();

    assert_eq!(changes.next().await, Some("icon-size".to_string()));
}

#[test]
fn in_memory_store_has_no_path() {
    let store = DocumentStore::in_memory(Map::new());
    assert!(store.path().is_none());
}
