//! Time-ordered maturity scheduler.
//!
//! A [`MaturityQueue`] hands out entity ids in ascending order of the instant
//! at which they become deliverable. Ids that share an instant are kept in a
//! FIFO bucket, so ties are served strictly in insertion order.
//!
//! The scheduler knows nothing about whether an id still refers to a live
//! entity. Callers are expected to validate every popped id and simply drop
//! the ones that no longer exist.

use crate::message::{EntityId, Timestamp};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// An id together with the instant it becomes deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaturityEntry {
    pub id: EntityId,
    pub available_at: Timestamp,
}

/// Reasons a pop yields nothing.
///
/// Readers treat both the same way: nothing can be delivered right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    #[error("maturity queue is empty")]
    Empty,

    #[error("earliest entry is not mature until {next_at}")]
    NotYetMature { next_at: Timestamp },
}

/// Delay queue keyed by availability time.
#[derive(Debug, Default)]
pub struct MaturityQueue {
    buckets: BTreeMap<Timestamp, VecDeque<EntityId>>,
    len: usize,
}

impl MaturityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` to become deliverable at `available_at`.
    pub fn insert(&mut self, id: EntityId, available_at: Timestamp) {
        self.buckets.entry(available_at).or_default().push_back(id);
        self.len += 1;
    }

    /// Remove and return the earliest id whose time has come.
    ///
    /// Never waits: if the earliest entry matures after `now` the call fails
    /// immediately with [`PopError::NotYetMature`].
    pub fn pop_earliest_mature(&mut self, now: Timestamp) -> Result<EntityId, PopError> {
        let mut bucket = self.buckets.first_entry().ok_or(PopError::Empty)?;
        if *bucket.key() > now {
            return Err(PopError::NotYetMature {
                next_at: *bucket.key(),
            });
        }

        let id = bucket.get_mut().pop_front().ok_or(PopError::Empty)?;
        if bucket.get().is_empty() {
            bucket.remove();
        }
        self.len -= 1;
        Ok(id)
    }

    /// Availability time of the earliest entry, mature or not.
    pub fn next_available_at(&self) -> Option<Timestamp> {
        self.buckets.keys().next().copied()
    }

    /// Number of scheduled entries, stale ones included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct availability times.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Every scheduled entry in delivery order.
    pub fn entries(&self) -> Vec<MaturityEntry> {
        self.buckets
            .iter()
            .flat_map(|(available_at, ids)| {
                ids.iter().map(move |id| MaturityEntry {
                    id: *id,
                    available_at: *available_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "maturity_tests.rs"]
mod tests;
