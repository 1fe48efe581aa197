//! Registry of named queues.
//!
//! [`QueueRegistry`] is the service object that owns every live queue. It is
//! built once at startup and shared by handle (typically `Arc<QueueRegistry>`)
//! with producers and consumers; there is no process-wide static.
//!
//! # Examples
//!
//! ```rust
//! use memqueue::{QueueRegistry, RegistryConfig};
//! use std::time::Duration;
//!
//! let registry = QueueRegistry::new(RegistryConfig::default()).unwrap();
//! let queue = registry.create("orders").unwrap();
//!
//! let id = queue.enqueue(b"order #1").unwrap();
//! let delivered = queue.read(Duration::from_secs(30)).unwrap();
//! assert_eq!(delivered.entity_id, id);
//!
//! queue.delete(&id).unwrap();
//! assert!(queue.close());
//! assert!(registry.lookup("orders").is_err());
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::error::{QueueError, QueueResult};
use crate::message::QueueName;
use crate::queue::Queue;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// Name to queue mapping shared between a registry and its queues, so a
/// closing queue can remove itself.
pub(crate) type QueueMap = Mutex<HashMap<QueueName, Arc<Queue>>>;

/// Registry enforcing unique queue names.
///
/// The registry lock is only held for single map operations. Queues returned
/// from [`create`](Self::create) or [`lookup`](Self::lookup) stay valid after
/// the lock is released; closing a queue disables it rather than tearing it
/// down.
pub struct QueueRegistry {
    queues: Arc<QueueMap>,
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
}

impl QueueRegistry {
    /// Create a registry that reads the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Validation`] if `config` fails
    /// [`RegistryConfig::validate`].
    pub fn new(config: RegistryConfig) -> QueueResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a registry driven by the given clock.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Validation`] if `config` fails
    /// [`RegistryConfig::validate`].
    pub fn with_clock(config: RegistryConfig, clock: Arc<dyn Clock>) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            config,
            clock,
        }
    }

    /// Register a new, empty queue under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::DuplicateName`] while another queue holds the
    /// name, and [`QueueError::Validation`] if the name is empty.
    pub fn create(&self, name: &str) -> QueueResult<Arc<Queue>> {
        let name = QueueName::new(name.to_string())?;

        let mut queues = self.lock_queues();
        match queues.entry(name) {
            Entry::Occupied(entry) => {
                debug!(queue = %entry.key(), "Queue name already registered");
                Err(QueueError::DuplicateName {
                    name: entry.key().to_string(),
                })
            }
            Entry::Vacant(entry) => {
                let queue = Arc::new(Queue::new(
                    entry.key().clone(),
                    self.config.clone(),
                    Arc::clone(&self.clock),
                    Arc::downgrade(&self.queues),
                ));
                info!(queue = %entry.key(), "Created queue");
                entry.insert(Arc::clone(&queue));
                Ok(queue)
            }
        }
    }

    /// Find the live queue registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownName`] if no queue holds the name.
    pub fn lookup(&self, name: &str) -> QueueResult<Arc<Queue>> {
        self.lock_queues()
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::UnknownName {
                name: name.to_string(),
            })
    }

    /// Names of all live queues, sorted
    pub fn names(&self) -> Vec<QueueName> {
        let mut names: Vec<QueueName> = self.lock_queues().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock_queues().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_queues().is_empty()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn lock_queues(&self) -> MutexGuard<'_, HashMap<QueueName, Arc<Queue>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::build(RegistryConfig::default(), Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("queues", &self.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
