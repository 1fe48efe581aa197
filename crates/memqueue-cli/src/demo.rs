//! Concurrent producer/consumer demonstration.
//!
//! Producers each enqueue a batch of payloads from one reused buffer, read the
//! same number back so those entities are hidden from everyone else, hold them
//! for a while, then delete everything they read. Consumers start late and
//! keep reading with a short visibility timeout until the queue has nothing
//! mature left, which only happens once the producers have deleted it all.
//!
//! Success means every produced entity reached the queue at the same time
//! (`max_entries` equals the total produced). Consumers also count how often
//! they were handed the entity they had just read, which with enough entities
//! in play should not happen.

use crate::CliError;
use memqueue::{EntityId, Queue, QueueError, QueueRegistry, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "demo_tests.rs"]
mod tests;

/// Demonstration parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    pub queue: String,
    pub producers: usize,
    pub consumers: usize,
    pub per_producer: usize,
    /// Size of the buffer every producer reuses for its payloads
    pub payload_size: usize,
    /// Visibility timeout producers read back with
    pub producer_timeout_ms: u64,
    /// Time producers keep their entities before deleting them
    pub hold_ms: u64,
    /// Time consumers wait before their first read
    pub consumer_delay_ms: u64,
    /// Visibility timeout consumers read with
    pub consumer_timeout_ms: u64,
    /// Pause between consumer reads
    pub consumer_interval_ms: u64,
}

impl DemoConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.producers == 0 {
            return Err(ValidationError::OutOfRange {
                field: "demo.producers".to_string(),
                message: "at least one producer is required".to_string(),
            });
        }
        if self.per_producer == 0 {
            return Err(ValidationError::OutOfRange {
                field: "demo.per_producer".to_string(),
                message: "producers must enqueue at least one payload".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            queue: "pqTest".to_string(),
            producers: 2,
            consumers: 2,
            per_producer: 10,
            payload_size: 100,
            producer_timeout_ms: 100,
            hold_ms: 5_000,
            consumer_delay_ms: 1_000,
            consumer_timeout_ms: 10,
            consumer_interval_ms: 11,
        }
    }
}

/// What each producer did
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProducerReport {
    pub enqueued: usize,
    /// Entities read back and later deleted, in read order
    pub entities: Vec<EntityId>,
    pub missed_reads: usize,
    pub failed_deletes: usize,
}

/// What each consumer did
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsumerReport {
    pub processed: usize,
    /// Reads that returned the same entity as the read before
    pub repeats: usize,
}

/// Outcome of a demonstration run
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub queue: String,
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<ConsumerReport>,
    pub max_entries: usize,
    pub repeats: usize,
    /// Whether the drained queue could be closed afterwards
    pub closed: bool,
}

impl DemoReport {
    /// Total payloads the producers enqueued
    pub fn expected_entries(&self) -> usize {
        self.producers.iter().map(|p| p.enqueued).sum()
    }

    /// Whether every produced entity was in the queue at once
    pub fn all_queued(&self) -> bool {
        self.max_entries == self.expected_entries()
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, producer) in self.producers.iter().enumerate() {
            writeln!(f, "From producer {}", index + 1)?;
            for (i, id) in producer.entities.iter().enumerate() {
                writeln!(f, "{i}) {id}")?;
            }
        }
        writeln!(f, "Max entries on the queue is {}", self.max_entries)?;
        if self.all_queued() {
            writeln!(f, "All produced entities did get queued")?;
        } else {
            writeln!(f, "All producer work did NOT get to the queue")?;
        }
        for (index, consumer) in self.consumers.iter().enumerate() {
            writeln!(
                f,
                "Consumer {} handled {} responses",
                index + 1,
                consumer.processed
            )?;
        }
        if self.repeats > 0 {
            writeln!(f, "{} back-to-back repeat deliveries", self.repeats)?;
        }
        writeln!(
            f,
            "Queue {} {}",
            self.queue,
            if self.closed { "closed" } else { "left open" }
        )
    }
}

/// Run producers and consumers against a fresh queue and report the outcome.
pub async fn run_demo(
    registry: Arc<QueueRegistry>,
    config: &DemoConfig,
) -> Result<DemoReport, CliError> {
    let queue = registry.create(&config.queue)?;

    let producers: Vec<JoinHandle<Result<ProducerReport, QueueError>>> = (0..config.producers)
        .map(|index| {
            let registry = Arc::clone(&registry);
            let config = config.clone();
            tokio::spawn(async move {
                let queue = registry.lookup(&config.queue)?;
                run_producer(index, &queue, &config).await
            })
        })
        .collect();

    let consumers: Vec<JoinHandle<Result<ConsumerReport, QueueError>>> = (0..config.consumers)
        .map(|index| {
            let registry = Arc::clone(&registry);
            let config = config.clone();
            tokio::spawn(async move {
                let queue = registry.lookup(&config.queue)?;
                run_consumer(index, &queue, &config).await
            })
        })
        .collect();

    let mut producer_reports = Vec::with_capacity(producers.len());
    for handle in producers {
        producer_reports.push(join(handle).await?);
    }
    let mut consumer_reports = Vec::with_capacity(consumers.len());
    for handle in consumers {
        consumer_reports.push(join(handle).await?);
    }

    let repeats: usize = consumer_reports.iter().map(|c| c.repeats).sum();
    let max_entries = queue.max_entries();
    let closed = queue.close();

    info!(
        queue = %config.queue,
        max_entries,
        repeats,
        closed,
        "Demo finished"
    );

    Ok(DemoReport {
        queue: config.queue.clone(),
        producers: producer_reports,
        consumers: consumer_reports,
        max_entries,
        repeats,
        closed,
    })
}

async fn join<T>(handle: JoinHandle<Result<T, QueueError>>) -> Result<T, CliError> {
    let result = handle.await.map_err(|e| CliError::CommandFailed {
        message: format!("demo task failed: {e}"),
    })?;
    Ok(result?)
}

async fn run_producer(
    index: usize,
    queue: &Queue,
    config: &DemoConfig,
) -> Result<ProducerReport, QueueError> {
    let buffer = vec![0u8; config.payload_size];
    let mut report = ProducerReport::default();

    for _ in 0..config.per_producer {
        queue.enqueue(&buffer)?;
        report.enqueued += 1;
    }

    let timeout = Duration::from_millis(config.producer_timeout_ms);
    for _ in 0..config.per_producer {
        match queue.read(timeout) {
            Ok(response) => report.entities.push(response.entity_id),
            Err(QueueError::NoEntity { .. }) => {
                warn!(producer = index, "Producer found nothing mature to read back");
                report.missed_reads += 1;
            }
            Err(e) => return Err(e),
        }
    }
    debug!(producer = index, read = report.entities.len(), "Producer holding entities");

    tokio::time::sleep(Duration::from_millis(config.hold_ms)).await;

    for id in &report.entities {
        if let Err(e) = queue.delete(id) {
            warn!(producer = index, entity_id = %id, error = %e, "Producer delete failed");
            report.failed_deletes += 1;
        }
    }
    debug!(producer = index, "Producer finished");
    Ok(report)
}

async fn run_consumer(
    index: usize,
    queue: &Queue,
    config: &DemoConfig,
) -> Result<ConsumerReport, QueueError> {
    let timeout = Duration::from_millis(config.consumer_timeout_ms);
    let interval = Duration::from_millis(config.consumer_interval_ms);
    let mut report = ConsumerReport::default();
    let mut last: Option<EntityId> = None;

    tokio::time::sleep(Duration::from_millis(config.consumer_delay_ms)).await;

    loop {
        let response = match queue.read(timeout) {
            Ok(response) => response,
            Err(QueueError::NoEntity { .. }) => break,
            Err(e) => return Err(e),
        };

        report.processed += 1;
        if last == Some(response.entity_id) {
            warn!(consumer = index, entity_id = %response.entity_id, "Same entity delivered twice in a row");
            report.repeats += 1;
        }
        last = Some(response.entity_id);

        tokio::time::sleep(interval).await;
    }

    debug!(consumer = index, processed = report.processed, "Consumer finished");
    Ok(report)
}
