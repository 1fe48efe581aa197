//! # memqueue
//!
//! In-process named queues with at-least-once delivery through visibility
//! timeouts, in the style of hosted receive/delete queue services.
//!
//! A consumer that reads an entity without deleting it sees the entity become
//! deliverable again once the visibility timeout it asked for has elapsed.
//! Nothing in this crate blocks: when no entity is ready, `read` returns
//! [`QueueError::NoEntity`] immediately and the caller picks its own retry
//! policy.
//!
//! ## Module Organization
//!
//! - [`message`] - Queue names, entity ids, timestamps and read responses
//! - [`maturity`] - Time-ordered scheduler of entity ids
//! - [`store`] - Per-queue payload storage
//! - [`queue`] - A single queue: enqueue, read, delete, close
//! - [`registry`] - Unique queue names and lookup
//! - [`clock`] - Time sources
//! - [`config`] - Registry configuration
//! - [`error`] - Error types

pub mod clock;
pub mod config;
pub mod error;
pub mod maturity;
pub mod message;
pub mod queue;
pub mod registry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegistryConfig;
pub use error::{QueueError, QueueResult, ValidationError};
pub use maturity::{MaturityEntry, MaturityQueue, PopError};
pub use message::{EntityId, QueueName, ReadResponse, Timestamp};
pub use queue::{Queue, QueueStats};
pub use registry::QueueRegistry;
pub use store::EntityStore;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
