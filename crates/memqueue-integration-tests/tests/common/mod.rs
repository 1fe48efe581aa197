//! Common test utilities for memqueue integration tests
//!
//! This module provides:
//! - Registries wired to a manual clock
//! - Helpers for draining queues and running work on plain threads

use memqueue::{EntityId, ManualClock, Queue, QueueError, QueueRegistry, RegistryConfig, Timestamp};
use std::sync::{Arc, Barrier};
use std::thread::JoinHandle;
use std::time::Duration;

/// Registry whose queues all read time from the returned clock
pub fn manual_registry() -> (Arc<QueueRegistry>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000_000)));
    let registry = QueueRegistry::with_clock(RegistryConfig::default(), clock.clone())
        .expect("default config is valid");
    (Arc::new(registry), clock)
}

/// Read until nothing is mature, returning the ids in delivery order
#[allow(dead_code)]
pub fn drain(queue: &Queue, timeout: Duration) -> Vec<EntityId> {
    let mut ids = Vec::new();
    loop {
        match queue.read(timeout) {
            Ok(response) => ids.push(response.entity_id),
            Err(QueueError::NoEntity { .. }) => return ids,
            Err(e) => panic!("unexpected read error: {e}"),
        }
    }
}

/// Run `count` copies of `work` on their own threads, released together
#[allow(dead_code)]
pub fn run_together<T, F>(count: usize, work: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(count));
    let work = Arc::new(work);
    let handles: Vec<JoinHandle<T>> = (0..count)
        .map(|index| {
            let barrier = Arc::clone(&barrier);
            let work = Arc::clone(&work);
            std::thread::spawn(move || {
                barrier.wait();
                work(index)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("worker thread panicked"))
        .collect()
}
