use serde_json::json;
use thingy_core::{
    KeyValueStorage, MemoryStorage, PathSegment, PathStore, StorageError, StoreError, parse_path,
};

fn store_with(key: &str, doc: serde_json::Value) -> (PathStore, MemoryStorage) {
    let storage = MemoryStorage::new();
    let store = PathStore::new(storage.clone());
    store.save(key, &doc).unwrap();
    (store, storage)
}

#[test]
fn update_preserves_sibling_keys() {
    let (store, _) = store_with("site", json!({"a": {"x": 1, "y": 2}}));

    let merged = store.update("site", &parse_path("a x"), json!(9)).unwrap();

    assert_eq!(merged, json!({"a": {"x": 9, "y": 2}}));
    assert_eq!(store.get("site"), Some(merged));
}

#[test]
fn update_is_idempotent() {
    let (store, _) = store_with("site", json!({"a": {"b": [1, 2]}, "c": true}));
    let path = parse_path("a b");

    let once = store.update("site", &path, json!({"title": "x"})).unwrap();
    let twice = store.update("site", &path, json!({"title": "x"})).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn bare_string_updates_inner_text_inside_arrays() {
    let (store, _) = store_with(
        "site",
        json!({"items": [{"innerText": "old", "other": 5}]}),
    );

    let merged = store
        .update("site", &parse_path("items 0"), json!("hello"))
        .unwrap();

    assert_eq!(merged, json!({"items": [{"innerText": "hello", "other": 5}]}));
}

#[test]
fn update_on_missing_document_starts_empty() {
    let store = PathStore::new(MemoryStorage::new());
    let path = vec![PathSegment::from("projects"), PathSegment::from(2usize)];

    let merged = store.update("fresh", &path, json!({"href": "/p"})).unwrap();

    assert_eq!(merged, json!({"projects": {"2": {"href": "/p"}}}));
}

#[test]
fn save_then_get_round_trips() {
    let doc = json!({"nested": {"list": [1, "two", null, {"three": 3.5}]}, "flag": false});
    let (store, _) = store_with("k", doc.clone());
    assert_eq!(store.get("k"), Some(doc));
}

#[test]
fn corrupt_documents_read_as_absent() {
    let storage = MemoryStorage::new();
    storage.set_item("broken", "{not json").unwrap();
    let store = PathStore::new(storage);

    assert!(store.try_get("broken").is_err());
    assert_eq!(store.get("broken"), None);
    assert_eq!(store.get_or("broken", json!({})), json!({}));
    assert_eq!(store.get_or("missing", json!([])), json!([]));

    let merged = store.update("broken", &parse_path("a"), json!("x")).unwrap();
    assert_eq!(merged, json!({"a": {"innerText": "x"}}));
}

#[test]
fn rejected_writes_surface_to_the_caller() {
    let store = PathStore::new(MemoryStorage::new().with_quota(16));
    let err = store
        .save("site", &json!({"long": "more than sixteen bytes"}))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Storage(StorageError::QuotaExceeded { .. })
    ));

    let store = PathStore::new(MemoryStorage::new().disabled());
    assert!(matches!(
        store.update("site", &parse_path("a"), json!(1)),
        Err(StoreError::Storage(StorageError::Disabled))
    ));
}

#[test]
fn leading_zero_segments_address_object_keys() {
    let (store, _) = store_with("site", json!({"zip": {"01": {"innerText": "a"}}}));

    let merged = store
        .update("site", &parse_path("zip 01"), json!("b"))
        .unwrap();

    assert_eq!(merged, json!({"zip": {"01": {"innerText": "b"}}}));
}

#[test]
fn huge_indices_leave_arrays_untouched() {
    let (store, _) = store_with("site", json!({"items": [1]}));

    let merged = store
        .update("site", &parse_path("items 18446744073709551615"), json!("x"))
        .unwrap();

    assert_eq!(merged, json!({"items": [1]}));
}
