//! Tests for message types.

use super::*;

#[test]
fn test_queue_name_accepts_any_non_empty_string() {
    for name in [
        "pqTest",
        "a",
        "orders.v1",
        "my queue",
        "a--b",
        "-x",
        "trailing-",
        "café",
        "special@chars",
    ] {
        let parsed = QueueName::new(name.to_string()).unwrap();
        assert_eq!(parsed.as_str(), name);
    }
    assert!(QueueName::new("a".repeat(10_000)).is_ok());
}

#[test]
fn test_queue_name_rejects_empty() {
    assert!(matches!(
        QueueName::new(String::new()),
        Err(ValidationError::Required { ref field }) if field == "queue_name"
    ));
}

#[test]
fn test_queue_name_from_str() {
    let name: QueueName = "orders".parse().unwrap();
    assert_eq!(name.as_str(), "orders");
    assert_eq!(name.to_string(), "orders");

    let spaced: QueueName = "has space".parse().unwrap();
    assert_eq!(spaced.as_str(), "has space");
    assert!("".parse::<QueueName>().is_err());
}

#[test]
fn test_entity_id_generation() {
    let id1 = EntityId::new();
    let id2 = EntityId::new();
    assert_ne!(id1, id2);
    assert_eq!(id1.as_uuid().get_version_num(), 4);
}

#[test]
fn test_entity_id_parses_its_display_form() {
    let id = EntityId::new();
    let parsed: EntityId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn test_entity_id_rejects_garbage() {
    assert!(matches!(
        "".parse::<EntityId>(),
        Err(ValidationError::Required { .. })
    ));
    assert!(matches!(
        "not-a-uuid".parse::<EntityId>(),
        Err(ValidationError::InvalidFormat { .. })
    ));
}

mod timestamps {
    use super::*;

    #[test]
    fn test_add_duration_in_millis() {
        let t = Timestamp::from_millis(1_000);
        assert_eq!(t + Duration::from_millis(250), Timestamp::from_millis(1_250));
        assert_eq!(t + Duration::ZERO, t);
    }

    #[test]
    fn test_add_saturates() {
        let t = Timestamp::from_millis(i64::MAX - 5);
        assert_eq!(t + Duration::from_secs(60), Timestamp::from_millis(i64::MAX));
        assert_eq!(
            Timestamp::from_millis(0) + Duration::MAX,
            Timestamp::from_millis(i64::MAX)
        );
    }

    #[test]
    fn test_ordering_follows_millis() {
        assert!(Timestamp::from_millis(1) < Timestamp::from_millis(2));
        assert!(Timestamp::from_millis(-1) < Timestamp::from_millis(0));
    }

    #[test]
    fn test_datetime_conversion() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t = Timestamp::from_datetime(dt);
        assert_eq!(t.as_datetime(), Some(dt));
        assert_eq!(t.to_string(), "2024-05-01 12:00:00.000 UTC");
    }

    #[test]
    fn test_now_is_recent() {
        let before = Utc::now().timestamp_millis();
        let now = Timestamp::now().as_millis();
        assert!(now >= before);
    }
}

#[test]
fn test_read_response_payload_str() {
    let response = ReadResponse {
        queue: QueueName::new("q".to_string()).unwrap(),
        entity_id: EntityId::new(),
        payload: Bytes::from_static(b"A test message"),
    };
    assert_eq!(response.payload_str(), Some("A test message"));

    let binary = ReadResponse {
        payload: Bytes::from_static(&[0xff, 0xfe]),
        ..response
    };
    assert_eq!(binary.payload_str(), None);
}
