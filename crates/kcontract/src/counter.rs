//! Counting Resource Tracker
//!
//! For resources held N times at once (sysfs groups, module references,
//! coherent buffers, enabled clocks). The count never goes below zero: an
//! over-release is reported and ignored.

use serde::{Deserialize, Serialize};

use crate::violation::{Violation, ViolationId, ViolationLog};

/// Non-negative hold counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counter {
    value: u64,
}

impl Counter {
    /// Create at zero
    #[must_use]
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Current count
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Whether nothing is held
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Take one hold; always succeeds
    pub fn increment(&mut self) {
        self.value = self.value.saturating_add(1);
        tracing::trace!(count = self.value, "counter increment");
    }

    /// Take one hold only if `succeeded`; returns `succeeded`
    pub fn try_acquire(&mut self, succeeded: bool) -> bool {
        if succeeded {
            self.increment();
        }
        succeeded
    }

    /// Release one hold, reporting an over-release
    pub fn decrement(
        &mut self,
        log: &mut ViolationLog,
        id: ViolationId,
        call: &'static str,
    ) -> Option<Violation> {
        let value = self.value;
        let raised = log.check(value >= 1, id, "count >= 1", call, || {
            format!("count == {value}")
        });
        if value >= 1 {
            self.value -= 1;
            tracing::trace!(count = self.value, "counter decrement");
        }
        raised
    }

    /// Assert every hold was released
    pub fn check_zero(
        &self,
        log: &mut ViolationLog,
        id: ViolationId,
        call: &'static str,
    ) -> Option<Violation> {
        let value = self.value;
        log.check(value == 0, id, "count == 0", call, || format!("count == {value}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const UNDER: ViolationId = ViolationId::new("test:count", "less initial decrement");
    const LEAK: ViolationId = ViolationId::new("test:count", "more initial at exit");

    #[test]
    fn test_balanced_holds() {
        let mut log = ViolationLog::new();
        let mut counter = Counter::new();
        counter.increment();
        counter.increment();
        assert_eq!(counter.value(), 2);
        assert!(counter.decrement(&mut log, UNDER, "put").is_none());
        assert!(counter.decrement(&mut log, UNDER, "put").is_none());
        assert!(counter.is_zero());
        assert!(counter.check_zero(&mut log, LEAK, "exit").is_none());
        assert!(log.is_clean());
    }

    #[test]
    fn test_over_release_reported_on_that_call() {
        let mut log = ViolationLog::new();
        let mut counter = Counter::new();
        counter.increment();
        counter.increment();
        counter.decrement(&mut log, UNDER, "put");
        counter.decrement(&mut log, UNDER, "put");
        assert!(log.is_clean());
        let raised = counter.decrement(&mut log, UNDER, "put").unwrap();
        assert_eq!(raised.id, UNDER);
        assert_eq!(raised.observed, "count == 0");
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_try_acquire_failure_leaves_count() {
        let mut counter = Counter::new();
        assert!(!counter.try_acquire(false));
        assert!(counter.is_zero());
        assert!(counter.try_acquire(true));
        assert_eq!(counter.value(), 1);
    }

    #[test]
    fn test_leak_reported() {
        let mut log = ViolationLog::new();
        let mut counter = Counter::new();
        counter.increment();
        let raised = counter.check_zero(&mut log, LEAK, "exit").unwrap();
        assert_eq!(raised.observed, "count == 1");
    }
}
