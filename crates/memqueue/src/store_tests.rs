//! Tests for the entity store.

use super::*;

#[test]
fn test_put_get_remove() {
    let mut store = EntityStore::new();
    let id = EntityId::new();
    assert!(store.is_empty());

    store.put(id, Bytes::from_static(b"payload"));
    assert!(store.contains(&id));
    assert_eq!(store.get(&id), Some(&Bytes::from_static(b"payload")));
    assert_eq!(store.len(), 1);

    assert!(store.remove(&id));
    assert!(!store.contains(&id));
    assert!(store.get(&id).is_none());
    assert!(store.is_empty());
}

#[test]
fn test_remove_unknown_reports_failure() {
    let mut store = EntityStore::new();
    let id = EntityId::new();
    assert!(!store.remove(&id));

    store.put(id, Bytes::new());
    assert!(store.remove(&id));
    assert!(!store.remove(&id));
}

#[test]
fn test_put_replaces_existing_payload() {
    let mut store = EntityStore::new();
    let id = EntityId::new();
    store.put(id, Bytes::from_static(b"first"));
    store.put(id, Bytes::from_static(b"second"));

    assert_eq!(store.len(), 1);
    assert_eq!(store.max_entries(), 1);
    assert_eq!(store.get(&id), Some(&Bytes::from_static(b"second")));
}

/// The high-water mark follows growth and ignores shrinkage.
#[test]
fn test_max_entries_never_decreases() {
    let mut store = EntityStore::new();
    let ids: Vec<EntityId> = (0..5).map(|_| EntityId::new()).collect();
    for id in &ids {
        store.put(*id, Bytes::new());
    }
    assert_eq!(store.max_entries(), 5);

    for id in &ids[..3] {
        store.remove(id);
    }
    assert_eq!(store.len(), 2);
    assert_eq!(store.max_entries(), 5);

    store.put(EntityId::new(), Bytes::new());
    assert_eq!(store.max_entries(), 5);

    for _ in 0..4 {
        store.put(EntityId::new(), Bytes::new());
    }
    assert_eq!(store.len(), 7);
    assert_eq!(store.max_entries(), 7);
}
