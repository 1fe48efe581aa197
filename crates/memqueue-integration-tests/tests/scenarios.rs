//! End-to-end producer scenarios
//!
//! These tests verify:
//! - Two producers of ten payloads each fill the queue to twenty
//! - Producers that reuse one buffer still store independent payloads
//! - Queue statistics follow the work

mod common;

use common::{manual_registry, run_together};
use memqueue::EntityId;
use std::collections::HashSet;
use std::time::Duration;

/// Two producers enqueue ten payloads each, read ten back, then delete what
/// they read. The queue must have held all twenty at once.
#[test]
fn test_two_producers_fill_queue() {
    let (registry, _clock) = manual_registry();
    let queue = registry.create("pqTest").unwrap();

    let reads = {
        let registry = std::sync::Arc::clone(&registry);
        run_together(2, move |_| {
            let queue = registry.lookup("pqTest").unwrap();
            let buffer = [0u8; 100];
            for _ in 0..10 {
                queue.enqueue(&buffer).unwrap();
            }
            let read: Vec<EntityId> = (0..10)
                .map(|_| queue.read(Duration::from_millis(100)).unwrap().entity_id)
                .collect();
            read
        })
    };

    let all: Vec<EntityId> = reads.iter().flatten().copied().collect();
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(unique.len(), 20);

    for id in &all {
        queue.delete(id).unwrap();
    }
    assert_eq!(queue.max_entries(), 20);
    assert!(queue.is_empty());
    assert!(queue.close());
}

/// Payloads are copied on enqueue; later writes to the buffer do not leak in.
#[test]
fn test_reused_buffer_payloads_are_independent() {
    let (registry, _clock) = manual_registry();
    let queue = registry.create("copies").unwrap();

    let mut buffer = [0u8; 4];
    let mut ids = Vec::new();
    for i in 0..4u8 {
        buffer.fill(i);
        ids.push(queue.enqueue(&buffer).unwrap());
    }

    for (i, id) in ids.iter().enumerate() {
        let response = queue.read(Duration::from_secs(1)).unwrap();
        assert_eq!(&response.entity_id, id);
        assert_eq!(response.payload, bytes::Bytes::from(vec![i as u8; 4]));
    }
}

/// Stats track live entities separately from stale schedule entries.
#[test]
fn test_stats_follow_work() {
    let (registry, clock) = manual_registry();
    let queue = registry.create("stats").unwrap();

    let a = queue.enqueue(b"a").unwrap();
    queue.enqueue(b"b").unwrap();
    queue.read(Duration::from_millis(10)).unwrap();
    queue.delete(&a).unwrap();

    let stats = queue.stats();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.scheduled, 2);
    assert_eq!(stats.maturity_buckets, 2);
    assert_eq!(stats.max_entries, 2);
    assert!(!stats.disabled);

    // The stale entry for `a` is dropped by the next read that reaches it
    clock.advance(Duration::from_millis(10));
    queue.read(Duration::from_millis(10)).unwrap();
    assert!(queue.read(Duration::ZERO).is_err());
    assert_eq!(queue.scheduled_len(), 1);

    let json = serde_json::to_value(queue.stats()).unwrap();
    assert_eq!(json["name"], "stats");
    assert_eq!(json["entities"], 1);
}
