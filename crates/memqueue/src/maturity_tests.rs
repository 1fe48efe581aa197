//! Tests for the maturity scheduler.

use super::*;

fn at(millis: i64) -> Timestamp {
    Timestamp::from_millis(millis)
}

mod popping {
    use super::*;

    /// Popping an empty queue reports `Empty` and leaves it empty.
    #[test]
    fn test_pop_empty() {
        let mut queue = MaturityQueue::new();
        assert_eq!(queue.pop_earliest_mature(at(0)), Err(PopError::Empty));
        assert!(queue.is_empty());
        assert_eq!(queue.next_available_at(), None);
    }

    /// An entry in the future is reported as not yet mature and stays put.
    #[test]
    fn test_pop_not_yet_mature() {
        let mut queue = MaturityQueue::new();
        let id = EntityId::new();
        queue.insert(id, at(100));

        assert_eq!(
            queue.pop_earliest_mature(at(99)),
            Err(PopError::NotYetMature { next_at: at(100) })
        );
        assert_eq!(queue.len(), 1);

        // Mature exactly at its availability time
        assert_eq!(queue.pop_earliest_mature(at(100)), Ok(id));
        assert!(queue.is_empty());
        assert_eq!(queue.bucket_count(), 0);
    }

    /// Entries come out in ascending availability order regardless of
    /// insertion order.
    #[test]
    fn test_pop_in_time_order() {
        let mut queue = MaturityQueue::new();
        let late = EntityId::new();
        let early = EntityId::new();
        let middle = EntityId::new();
        queue.insert(late, at(30));
        queue.insert(early, at(10));
        queue.insert(middle, at(20));

        assert_eq!(queue.pop_earliest_mature(at(50)), Ok(early));
        assert_eq!(queue.pop_earliest_mature(at(50)), Ok(middle));
        assert_eq!(queue.pop_earliest_mature(at(50)), Ok(late));
        assert_eq!(queue.pop_earliest_mature(at(50)), Err(PopError::Empty));
    }

    /// Entries sharing a timestamp are served first-in, first-out.
    #[test]
    fn test_ties_are_fifo() {
        let mut queue = MaturityQueue::new();
        let ids: Vec<EntityId> = (0..10).map(|_| EntityId::new()).collect();
        for id in &ids {
            queue.insert(*id, at(5));
        }
        assert_eq!(queue.bucket_count(), 1);

        let popped: Vec<EntityId> = (0..10)
            .map(|_| queue.pop_earliest_mature(at(5)).unwrap())
            .collect();
        assert_eq!(popped, ids);
    }

    /// A mature earlier bucket is drained before a later one, and the later
    /// one is only served once the clock reaches it.
    #[test]
    fn test_buckets_drain_as_time_advances() {
        let mut queue = MaturityQueue::new();
        for i in 0..10 {
            for _ in 0..10 {
                queue.insert(EntityId::new(), at(i));
            }
        }
        assert_eq!(queue.len(), 100);
        assert_eq!(queue.bucket_count(), 10);

        for now in 0..10 {
            for _ in 0..10 {
                assert!(queue.pop_earliest_mature(at(now)).is_ok());
            }
            if now < 9 {
                assert_eq!(
                    queue.pop_earliest_mature(at(now)),
                    Err(PopError::NotYetMature {
                        next_at: at(now + 1)
                    })
                );
            }
        }

        assert!(queue.is_empty());
        assert_eq!(queue.bucket_count(), 0);
    }
}

mod inspection {
    use super::*;

    /// Snapshot lists entries in the order they would be delivered.
    #[test]
    fn test_entries_snapshot_order() {
        let mut queue = MaturityQueue::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let c = EntityId::new();
        queue.insert(b, at(2));
        queue.insert(a, at(1));
        queue.insert(c, at(2));

        let entries = queue.entries();
        assert_eq!(
            entries,
            vec![
                MaturityEntry {
                    id: a,
                    available_at: at(1)
                },
                MaturityEntry {
                    id: b,
                    available_at: at(2)
                },
                MaturityEntry {
                    id: c,
                    available_at: at(2)
                },
            ]
        );
        assert_eq!(queue.next_available_at(), Some(at(1)));
    }

    /// The same id may be scheduled more than once; the scheduler does not
    /// deduplicate.
    #[test]
    fn test_duplicate_ids_are_kept() {
        let mut queue = MaturityQueue::new();
        let id = EntityId::new();
        queue.insert(id, at(1));
        queue.insert(id, at(2));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_earliest_mature(at(2)), Ok(id));
        assert_eq!(queue.pop_earliest_mature(at(2)), Ok(id));
    }
}
