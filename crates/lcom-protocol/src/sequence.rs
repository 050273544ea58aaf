//! Cyclic 5-bit sequence counter.
//!
//! Every envelope consumes exactly one id, so a gap in the ids seen by the
//! receiver means a frame was lost.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::types::SequenceId;

/// Issues sequence ids 0, 1, ..., 31, 0, ...
///
/// The counter is shared by every producer that frames envelopes for the
/// same link; `next` is a single atomic increment-and-read, so concurrent
/// callers never receive the same id within one cycle.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    /// Raw id to hand out next. Wraps at 256, a multiple of 32.
    next: AtomicU8,
}

impl SequenceCounter {
    /// Create a counter whose first id is 0.
    pub fn new() -> Self {
        SequenceCounter {
            next: AtomicU8::new(0),
        }
    }

    /// Create a counter whose first id is `first`.
    pub fn starting_at(first: SequenceId) -> Self {
        SequenceCounter {
            next: AtomicU8::new(first.value()),
        }
    }

    /// Take the next id.
    pub fn next(&self) -> SequenceId {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        SequenceId::from_masked(raw)
    }

    /// The id the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> SequenceId {
        SequenceId::from_masked(self.next.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_cycles_through_32_ids() {
        let counter = SequenceCounter::new();

        for expected in 0..32u8 {
            assert_eq!(counter.next().value(), expected);
        }
        assert_eq!(counter.next().value(), 0);
    }

    #[test]
    fn test_counter_keeps_cycling_past_byte_wrap() {
        let counter = SequenceCounter::new();

        for i in 0..1000u32 {
            assert_eq!(counter.next().value() as u32, i % 32);
        }
    }

    #[test]
    fn test_peek_does_not_advance() {
        let counter = SequenceCounter::starting_at(SequenceId::new(30).unwrap());
        assert_eq!(counter.peek().value(), 30);
        assert_eq!(counter.peek().value(), 30);
        assert_eq!(counter.next().value(), 30);
        assert_eq!(counter.next().value(), 31);
        assert_eq!(counter.peek().value(), 0);
    }

    #[test]
    fn test_concurrent_callers_get_distinct_ids() {
        let counter = Arc::new(SequenceCounter::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || (0..8).map(|_| counter.next().value()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "id {} issued twice", id);
            }
        }
        assert_eq!(seen.len(), 32);
    }
}
