//! Tests for error types.

use super::*;

#[test]
fn test_error_transience() {
    assert!(QueueError::NoEntity {
        queue: "test".to_string(),
    }
    .is_transient());

    assert!(!QueueError::UnknownName {
        name: "test".to_string(),
    }
    .is_transient());

    assert!(!QueueError::DuplicateName {
        name: "test".to_string(),
    }
    .is_transient());

    assert!(!QueueError::QueueDisabled {
        name: "test".to_string(),
    }
    .should_retry());

    assert!(!QueueError::PayloadTooLarge {
        size: 1000,
        max_size: 500
    }
    .is_transient());
}

#[test]
fn test_retry_suggestions() {
    let no_entity = QueueError::NoEntity {
        queue: "test".to_string(),
    };
    assert_eq!(no_entity.retry_after(), Some(Duration::from_millis(10)));

    let unknown = QueueError::UnknownName {
        name: "test".to_string(),
    };
    assert_eq!(unknown.retry_after(), None);
}

#[test]
fn test_validation_error_converts() {
    let err: QueueError = ValidationError::Required {
        field: "queue_name".to_string(),
    }
    .into();
    assert!(matches!(err, QueueError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "Validation error: Required field missing: queue_name"
    );
}

#[test]
fn test_display_names_the_queue() {
    let err = QueueError::QueueDisabled {
        name: "orders".to_string(),
    };
    assert_eq!(err.to_string(), "Queue 'orders' has been closed");
}
