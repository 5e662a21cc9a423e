//! Logical clock supplying `now` to mutating operations.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing sequence number.
///
/// Each mutating API call ticks the clock once; the returned value is the
/// logical time stamped on the records it writes.
#[derive(Debug, Default)]
pub struct LogicalClock {
    current: AtomicU64,
}

impl LogicalClock {
    /// Create a clock starting at `start`.
    pub fn new(start: u64) -> Self {
        Self {
            current: AtomicU64::new(start),
        }
    }

    /// Advance the clock and return the new time.
    pub fn tick(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current time without advancing.
    pub fn now(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Move the clock forward to at least `value`. Never moves backwards.
    pub fn advance_to(&self, value: u64) {
        self.current.fetch_max(value, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_monotonic() {
        let clock = LogicalClock::new(10);
        assert_eq!(clock.tick(), 11);
        assert_eq!(clock.tick(), 12);
        assert_eq!(clock.now(), 12);
    }

    #[test]
    fn test_advance_never_rewinds() {
        let clock = LogicalClock::new(0);
        clock.advance_to(40);
        assert_eq!(clock.now(), 40);
        clock.advance_to(5);
        assert_eq!(clock.now(), 40);
    }
}
