//! Built-in manual checks.
//!
//! Each check drives the library through a short scenario on its own registry
//! and a [`ManualClock`], so results do not depend on machine speed.

use memqueue::{
    Clock, EntityId, ManualClock, MaturityQueue, PopError, QueueError, QueueRegistry,
    RegistryConfig, Timestamp,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;

/// Result of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Results of a full check run
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            let status = if outcome.passed { "ok" } else { "FAILED" };
            writeln!(f, "[{status}] {}: {}", outcome.name, outcome.detail)?;
        }
        writeln!(
            f,
            "{} passed, {} failed",
            self.outcomes.len() - self.failed(),
            self.failed()
        )
    }
}

type Check = fn() -> Result<String, String>;

const CHECKS: &[(&str, Check)] = &[
    ("scheduler-empty", scheduler_empty),
    ("scheduler-maturity", scheduler_maturity),
    ("duplicate-name", duplicate_name),
    ("lookup-by-name", lookup_by_name),
    ("visibility-timeout", visibility_timeout),
    ("close-requires-empty", close_requires_empty),
];

/// Run every check and collect the outcomes
pub fn run_checks() -> CheckReport {
    let outcomes = CHECKS
        .iter()
        .map(|(name, check)| {
            let outcome = match check() {
                Ok(detail) => CheckOutcome {
                    name,
                    passed: true,
                    detail,
                },
                Err(detail) => CheckOutcome {
                    name,
                    passed: false,
                    detail,
                },
            };
            if outcome.passed {
                debug!(check = name, "Check passed");
            } else {
                warn!(check = name, detail = %outcome.detail, "Check failed");
            }
            outcome
        })
        .collect();

    CheckReport { outcomes }
}

fn ensure(condition: bool, failure: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(failure())
    }
}

fn manual_registry() -> Result<(QueueRegistry, Arc<ManualClock>), String> {
    let clock = Arc::new(ManualClock::new(Timestamp::now()));
    let registry = QueueRegistry::with_clock(RegistryConfig::default(), clock.clone())
        .map_err(|e| format!("registry setup failed: {e}"))?;
    Ok((registry, clock))
}

/// Nothing can be popped from an empty scheduler
fn scheduler_empty() -> Result<String, String> {
    let mut schedule = MaturityQueue::new();
    match schedule.pop_earliest_mature(Timestamp::now()) {
        Err(PopError::Empty) => Ok("empty scheduler yields nothing".to_string()),
        other => Err(format!("expected Empty, got {other:?}")),
    }
}

/// Ten entries due now come out before ten due a millisecond later, and the
/// later ones only once their time has come
fn scheduler_maturity() -> Result<String, String> {
    let clock = ManualClock::new(Timestamp::now());
    let now = clock.now();
    let mut schedule = MaturityQueue::new();
    for _ in 0..10 {
        schedule.insert(EntityId::new(), now);
    }
    for _ in 0..10 {
        schedule.insert(EntityId::new(), now + Duration::from_millis(1));
    }

    for i in 0..10 {
        schedule
            .pop_earliest_mature(clock.now())
            .map_err(|e| format!("pop {i} of the first batch failed: {e}"))?;
    }
    ensure(
        matches!(
            schedule.pop_earliest_mature(clock.now()),
            Err(PopError::NotYetMature { .. })
        ),
        || "second batch was delivered early".to_string(),
    )?;

    clock.advance(Duration::from_millis(2));
    for i in 0..10 {
        schedule
            .pop_earliest_mature(clock.now())
            .map_err(|e| format!("pop {i} of the second batch failed: {e}"))?;
    }
    ensure(schedule.is_empty(), || {
        format!("{} entries left over", schedule.len())
    })?;

    Ok("20 entries delivered in maturity order".to_string())
}

/// A second queue with the same name is refused
fn duplicate_name() -> Result<String, String> {
    let (registry, _clock) = manual_registry()?;
    registry
        .create("Test")
        .map_err(|e| format!("first create failed: {e}"))?;
    match registry.create("Test") {
        Err(QueueError::DuplicateName { .. }) => {
            Ok("rightly prohibited creating a second queue named Test".to_string())
        }
        Ok(_) => Err("second create with the same name succeeded".to_string()),
        Err(e) => Err(format!("unexpected error: {e}")),
    }
}

/// A queue can be retrieved by the name it was created under
fn lookup_by_name() -> Result<String, String> {
    let (registry, _clock) = manual_registry()?;
    let created = registry
        .create("Test")
        .map_err(|e| format!("create failed: {e}"))?;
    let found = registry
        .lookup("Test")
        .map_err(|e| format!("lookup failed: {e}"))?;

    ensure(Arc::ptr_eq(&created, &found), || {
        "lookup returned a different queue".to_string()
    })?;
    ensure(
        matches!(
            registry.lookup("Missing"),
            Err(QueueError::UnknownName { .. })
        ),
        || "lookup of an unregistered name succeeded".to_string(),
    )?;
    Ok(format!("found queue {} by name", found.name()))
}

/// Read hides an entity for its visibility timeout; delete removes it
fn visibility_timeout() -> Result<String, String> {
    let (registry, clock) = manual_registry()?;
    let queue = registry
        .create("q")
        .map_err(|e| format!("create failed: {e}"))?;

    let id = queue
        .enqueue(b"A")
        .map_err(|e| format!("enqueue failed: {e}"))?;
    let first = queue
        .read(Duration::from_millis(1000))
        .map_err(|e| format!("first read failed: {e}"))?;
    ensure(first.entity_id == id && first.payload_str() == Some("A"), || {
        "first read returned the wrong entity".to_string()
    })?;

    ensure(
        matches!(
            queue.read(Duration::ZERO),
            Err(QueueError::NoEntity { .. })
        ),
        || "entity was visible before its timeout".to_string(),
    )?;

    clock.advance(Duration::from_millis(1000));
    let again = queue
        .read(Duration::ZERO)
        .map_err(|e| format!("read after timeout failed: {e}"))?;
    ensure(again.entity_id == id, || {
        "a different entity reappeared after the timeout".to_string()
    })?;

    queue
        .delete(&id)
        .map_err(|e| format!("delete failed: {e}"))?;
    ensure(
        matches!(
            queue.read(Duration::ZERO),
            Err(QueueError::NoEntity { .. })
        ),
        || "deleted entity was delivered".to_string(),
    )?;
    ensure(
        matches!(queue.delete(&id), Err(QueueError::NoEntity { .. })),
        || "second delete succeeded".to_string(),
    )?;

    Ok("entity hidden for 1000ms, redelivered, then deleted".to_string())
}

/// Close is refused while entities remain and releases the name afterwards
fn close_requires_empty() -> Result<String, String> {
    let (registry, _clock) = manual_registry()?;
    let queue = registry
        .create("delete")
        .map_err(|e| format!("create failed: {e}"))?;
    let id = queue
        .enqueue(b"work")
        .map_err(|e| format!("enqueue failed: {e}"))?;

    ensure(!queue.close(), || "non-empty queue closed".to_string())?;
    queue
        .delete(&id)
        .map_err(|e| format!("delete failed: {e}"))?;
    ensure(queue.close(), || "empty queue refused to close".to_string())?;
    ensure(registry.lookup("delete").is_err(), || {
        "closed queue is still registered".to_string()
    })?;
    ensure(
        matches!(
            queue.enqueue(b"late"),
            Err(QueueError::QueueDisabled { .. })
        ),
        || "closed queue accepted an enqueue".to_string(),
    )?;

    Ok("queue gone".to_string())
}
