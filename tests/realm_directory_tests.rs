/// Realm directory tests
///
/// Tests for realm-scoped writes, LRU eviction and derived fields
/// Run with: cargo test --test realm_directory_tests

use realmstore::{RealmError, RealmId, RealmStore, RealmStoreConfig, patch_from};
use serde_json::json;
use tokio_test::{assert_pending, assert_ready_ok, task};

fn id(s: &str) -> RealmId {
    RealmId::from(s)
}

#[test]
fn test_patches_merge_in_call_order() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_current_realm("home");

    store.set_for_realm(patch_from(json!({"a": 1, "b": 1}))).unwrap();
    store.set_for_realm(patch_from(json!({"b": 2, "c": 2}))).unwrap();
    store.set_for_realm(patch_from(json!({"c": 3}))).unwrap();

    let state = store.get();
    let data = state.current_data().unwrap();
    assert_eq!(data, &patch_from(json!({"a": 1, "b": 2, "c": 3})));
}

#[test]
fn test_write_creates_missing_realm() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_current_realm("fresh");
    assert!(!store.contains_realm(&id("fresh")));

    store.set_for_realm(patch_from(json!({"x": "v"}))).unwrap();

    assert!(store.contains_realm(&id("fresh")));
    assert_eq!(store.get_for_realm("x"), Some(json!("v")));
}

#[test]
fn test_capacity_never_exceeded() {
    let max = 3;
    let mut store = RealmStore::new(max).unwrap();

    for i in 0..=max {
        store.set_current_realm(format!("realm-{}", i));
        store.set_for_realm(patch_from(json!({"i": i}))).unwrap();
        assert!(store.realm_count() <= max);
    }

    assert_eq!(store.realm_count(), max);
    assert!(!store.contains_realm(&id("realm-0")));
    for i in 1..=max {
        assert!(store.contains_realm(&RealmId::from(format!("realm-{}", i))));
    }
    assert_eq!(store.stats().evictions, 1);
}

#[test]
fn test_write_access_promotes_realm() {
    let mut store = RealmStore::new(2).unwrap();
    store.set_for(id("a"), patch_from(json!({"n": 1})));
    store.set_for(id("b"), patch_from(json!({"n": 2})));

    // touch A again before C arrives
    store.set_for(id("a"), patch_from(json!({"n": 3})));
    store.set_for(id("c"), patch_from(json!({"n": 4})));

    assert!(store.contains_realm(&id("a")));
    assert!(!store.contains_realm(&id("b")));
    assert!(store.contains_realm(&id("c")));
}

#[test]
fn test_read_access_promotes_realm() {
    let mut store = RealmStore::new(2).unwrap();
    store.set_for(id("a"), patch_from(json!({"n": 1})));
    store.set_for(id("b"), patch_from(json!({"n": 2})));

    store.set_current_realm("a");
    assert_eq!(store.get_for_realm("n"), Some(json!(1)));
    store.set_for(id("c"), patch_from(json!({"n": 3})));

    assert!(store.contains_realm(&id("a")));
    assert!(!store.contains_realm(&id("b")));
}

#[test]
fn test_without_access_oldest_is_evicted() {
    let mut store = RealmStore::new(2).unwrap();
    store.set_for(id("a"), patch_from(json!({})));
    store.set_for(id("b"), patch_from(json!({})));
    store.set_for(id("c"), patch_from(json!({})));

    assert!(!store.contains_realm(&id("a")));
    assert_eq!(store.get().realms().realm_ids(), vec![id("c"), id("b")]);
}

#[test]
fn test_compute_for_realm_default_and_falsy_quirk() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_current_realm("home");
    let x = store.compute_for_realm("x", json!("default"));

    assert_eq!(x.get(), json!("default"));

    store.set_for_realm(patch_from(json!({"x": "v"}))).unwrap();
    assert_eq!(x.get(), json!("v"));

    store.set_for_realm(patch_from(json!({"x": 0}))).unwrap();
    assert_eq!(x.get(), json!("default"));

    store.set_for_realm(patch_from(json!({"x": ""}))).unwrap();
    assert_eq!(x.get(), json!("default"));

    store.set_for_realm(patch_from(json!({"x": false}))).unwrap();
    assert_eq!(x.get(), json!("default"));
}

#[test]
fn test_compute_follows_current_realm() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_for(id("a"), patch_from(json!({"title": "A"})));
    store.set_for(id("b"), patch_from(json!({"title": "B"})));
    let title = store.compute_for_realm("title", json!("none"));

    assert_eq!(title.get(), json!("none"));

    store.set_current_realm("a");
    assert_eq!(title.get(), json!("A"));

    store.set_current_realm("b");
    assert_eq!(title.get(), json!("B"));
    assert_eq!(store.get_field("title"), Some(json!("B")));

    store.set_current_realm("missing");
    assert_eq!(title.get(), json!("none"));
}

#[test]
fn test_compute_same_key_keeps_first_default() {
    let mut store = RealmStore::new(4).unwrap();
    let first = store.compute_for_realm("x", json!(1));
    let second = store.compute_for_realm("x", json!(2));

    assert_eq!(first.key(), "x");
    assert_eq!(second.get(), json!(1));
}

#[test]
fn test_compute_handle_tracks_changes() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_current_realm("home");
    let mut x = store.compute_for_realm("x", json!(null));
    assert!(!x.has_changed());

    store.set_for_realm(patch_from(json!({"y": 1}))).unwrap();
    assert!(!x.has_changed());

    store.set_for_realm(patch_from(json!({"x": 1}))).unwrap();
    assert!(x.has_changed());
    assert_eq!(x.latest(), json!(1));
    assert!(!x.has_changed());
}

#[test]
fn test_compute_changed_wakes_waiter() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_current_realm("home");
    let mut x = store.compute_for_realm("x", json!("default"));

    let mut changed = task::spawn(x.changed());
    assert_pending!(changed.poll());

    store.set_for_realm(patch_from(json!({"x": "v"}))).unwrap();

    assert!(changed.is_woken());
    assert_ready_ok!(changed.poll());
}

#[test]
fn test_every_mutation_publishes() {
    let mut store = RealmStore::new(4).unwrap();
    let rx = store.subscribe();

    store.set_current_realm("home");
    assert!(rx.has_changed().unwrap());
    let after_realm = store.get().version();

    store.set_for_realm(patch_from(json!({"a": 1}))).unwrap();
    assert_eq!(store.get().version(), after_realm + 1);
    assert_eq!(store.get().current_realm(), Some(&id("home")));
}

#[test]
fn test_initial_state_and_top_level_set() {
    let config = RealmStoreConfig::new(4).initial_field("online", json!(false));
    let mut store = RealmStore::with_config(config).unwrap();

    assert_eq!(store.get_field("online"), Some(json!(false)));

    store.set(patch_from(json!({"online": true}))).unwrap();
    assert_eq!(store.get_field("online"), Some(json!(true)));
}

#[test]
fn test_missing_realm_reads_are_not_errors() {
    let mut store = RealmStore::new(4).unwrap();
    assert_eq!(store.get_for_realm("x"), None);

    store.set_current_realm("nowhere");
    assert_eq!(store.get_for_realm("x"), None);
    assert_eq!(store.realm_count(), 0);
}

#[test]
fn test_remove_realm() {
    let mut store = RealmStore::new(4).unwrap();
    store.set_for(id("a"), patch_from(json!({"k": 1})));

    assert_eq!(store.remove_realm(&id("a")), Some(patch_from(json!({"k": 1}))));
    assert_eq!(store.remove_realm(&id("a")), None);
    assert_eq!(store.realm_count(), 0);
}

#[test]
fn test_unset_realm_write_error() {
    let mut store = RealmStore::new(4).unwrap();
    let result = store.set_for_realm(patch_from(json!({"a": 1})));

    assert!(matches!(result, Err(RealmError::UnsetRealm { .. })));
    assert_eq!(store.realm_count(), 0);
}
