//! Per-queue payload storage.

use crate::message::EntityId;
use bytes::Bytes;
use std::collections::HashMap;

/// Payloads keyed by entity id, plus the largest size the map ever reached.
///
/// Presence of an id here is the only thing that makes an entity live.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Bytes>,
    max_entries: usize,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the payload for `id`, raising the high-water mark if
    /// the store grew past it.
    pub fn put(&mut self, id: EntityId, payload: Bytes) {
        self.entities.insert(id, payload);
        self.max_entries = self.max_entries.max(self.entities.len());
    }

    pub fn get(&self, id: &EntityId) -> Option<&Bytes> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Returns `false` when `id` was not present.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        self.entities.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Largest number of entities ever held at once. Never decreases.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
