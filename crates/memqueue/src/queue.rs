//! A single named queue with visibility-timeout delivery.
//!
//! Each [`Queue`] pairs an [`EntityStore`] with a [`MaturityQueue`]:
//!
//! ```text
//! MaturityQueue              EntityStore
//! (available_at, id) <-----> id -> payload
//! ```
//!
//! - `enqueue` stores the payload and schedules its id as mature right away.
//! - `read` pops mature ids until it finds one that is still in the store,
//!   reschedules it `visibility_timeout` into the future and returns it. Ids no
//!   longer in the store were deleted; they are dropped on the spot.
//! - `delete` only touches the store. The id's pending schedule entry goes
//!   stale and is discarded by whichever `read` pops it next.
//!
//! Nothing here waits. A read with nothing mature fails with
//! [`QueueError::NoEntity`] and the caller decides when to try again.
//!
//! All four operations run under one mutex per queue; queues never share a
//! lock with each other.

use crate::clock::Clock;
use crate::config::RegistryConfig;
use crate::error::{QueueError, QueueResult};
use crate::maturity::{MaturityEntry, MaturityQueue};
use crate::message::{EntityId, QueueName, ReadResponse, Timestamp};
use crate::registry::QueueMap;
use crate::store::EntityStore;
use bytes::Bytes;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// State guarded by the queue lock
#[derive(Debug, Default)]
struct QueueState {
    store: EntityStore,
    schedule: MaturityQueue,
    disabled: bool,
}

/// Point-in-time view of a queue for monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub name: QueueName,
    /// Live entities
    pub entities: usize,
    /// Schedule entries, stale ones included
    pub scheduled: usize,
    /// Distinct availability times in the schedule
    pub maturity_buckets: usize,
    pub max_entries: usize,
    pub next_available_at: Option<Timestamp>,
    pub disabled: bool,
}

/// A named queue. Obtain one from [`QueueRegistry`](crate::QueueRegistry).
pub struct Queue {
    name: QueueName,
    state: Mutex<QueueState>,
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
    registry: Weak<QueueMap>,
}

impl Queue {
    pub(crate) fn new(
        name: QueueName,
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        registry: Weak<QueueMap>,
    ) -> Self {
        Self {
            name,
            state: Mutex::new(QueueState::default()),
            config,
            clock,
            registry,
        }
    }

    pub fn name(&self) -> &QueueName {
        &self.name
    }

    /// Add a payload and return the id it was stored under.
    ///
    /// The payload is copied, so the caller may reuse its buffer right away.
    /// The entity is deliverable immediately.
    pub fn enqueue(&self, payload: &[u8]) -> QueueResult<EntityId> {
        let id = EntityId::new();
        let mut state = self.lock_state();
        if state.disabled {
            return Err(self.disabled_error());
        }
        if payload.len() > self.config.max_payload_size {
            return Err(QueueError::PayloadTooLarge {
                size: payload.len(),
                max_size: self.config.max_payload_size,
            });
        }

        let now = self.clock.now();
        state.store.put(id, Bytes::copy_from_slice(payload));
        state.schedule.insert(id, now);

        debug!(
            queue = %self.name,
            entity_id = %id,
            size = payload.len(),
            entities = state.store.len(),
            "Enqueued entity"
        );
        Ok(id)
    }

    /// Deliver the earliest mature entity and hide it for `visibility_timeout`.
    ///
    /// The entity stays in the queue. Unless it is deleted before the timeout
    /// elapses, a later read will deliver it again.
    pub fn read(&self, visibility_timeout: Duration) -> QueueResult<ReadResponse> {
        let mut state = self.lock_state();
        if state.disabled {
            return Err(self.disabled_error());
        }

        let now = self.clock.now();
        let mut discarded = 0usize;
        loop {
            let id = match state.schedule.pop_earliest_mature(now) {
                Ok(id) => id,
                Err(reason) => {
                    trace!(queue = %self.name, discarded, %reason, "Nothing mature to deliver");
                    return Err(QueueError::NoEntity {
                        queue: self.name.to_string(),
                    });
                }
            };

            // Deleted since it was scheduled
            let Some(payload) = state.store.get(&id).cloned() else {
                discarded += 1;
                trace!(queue = %self.name, entity_id = %id, "Discarded stale schedule entry");
                continue;
            };

            let available_at = now + visibility_timeout;
            state.schedule.insert(id, available_at);

            debug!(
                queue = %self.name,
                entity_id = %id,
                discarded,
                %available_at,
                "Delivered entity"
            );
            return Ok(ReadResponse {
                queue: self.name.clone(),
                entity_id: id,
                payload,
            });
        }
    }

    /// [`read`](Self::read) with the registry's default visibility timeout.
    pub fn read_default(&self) -> QueueResult<ReadResponse> {
        self.read(self.config.default_visibility_timeout())
    }

    /// Remove an entity for good.
    ///
    /// Fails with [`QueueError::NoEntity`] if the id is unknown, was already
    /// deleted, or the queue is closed.
    pub fn delete(&self, id: &EntityId) -> QueueResult<()> {
        let mut state = self.lock_state();
        if state.disabled || !state.store.remove(id) {
            return Err(QueueError::NoEntity {
                queue: self.name.to_string(),
            });
        }

        debug!(
            queue = %self.name,
            entity_id = %id,
            entities = state.store.len(),
            "Deleted entity"
        );
        Ok(())
    }

    /// Close the queue if it holds no entities.
    ///
    /// On success the queue is disabled and its name is released from the
    /// registry. Returns `false`, changing nothing, while any entity remains
    /// or if the queue was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.lock_state();
        if state.disabled {
            debug!(queue = %self.name, "Queue already closed");
            return false;
        }
        if !state.store.is_empty() {
            warn!(
                queue = %self.name,
                entities = state.store.len(),
                "Refusing to close non-empty queue"
            );
            return false;
        }

        // Disable before touching the registry so racing enqueues are refused.
        // The queue lock stays held; nothing takes the registry lock first and
        // a queue lock second.
        state.disabled = true;
        if let Some(registry) = self.registry.upgrade() {
            let mut queues = registry.lock().unwrap_or_else(PoisonError::into_inner);
            let registered_here = queues
                .get(self.name.as_str())
                .is_some_and(|queue| std::ptr::eq(Arc::as_ptr(queue), self));
            if registered_here {
                queues.remove(self.name.as_str());
            }
        }

        info!(
            queue = %self.name,
            max_entries = state.store.max_entries(),
            "Closed queue"
        );
        true
    }

    /// Largest number of entities this queue ever held at once.
    pub fn max_entries(&self) -> usize {
        self.lock_state().store.max_entries()
    }

    /// Live entities currently stored
    pub fn len(&self) -> usize {
        self.lock_state().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().store.is_empty()
    }

    pub fn is_disabled(&self) -> bool {
        self.lock_state().disabled
    }

    /// Schedule entries, live and stale
    pub fn scheduled_len(&self) -> usize {
        self.lock_state().schedule.len()
    }

    /// Snapshot of the schedule in delivery order, stale entries included.
    pub fn schedule(&self) -> Vec<MaturityEntry> {
        self.lock_state().schedule.entries()
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock_state();
        QueueStats {
            name: self.name.clone(),
            entities: state.store.len(),
            scheduled: state.schedule.len(),
            maturity_buckets: state.schedule.bucket_count(),
            max_entries: state.store.max_entries(),
            next_available_at: state.schedule.next_available_at(),
            disabled: state.disabled,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock is still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn disabled_error(&self) -> QueueError {
        QueueError::QueueDisabled {
            name: self.name.to_string(),
        }
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
