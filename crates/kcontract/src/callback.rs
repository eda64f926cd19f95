//! Callback invocation tracking and error propagation.
//!
//! [`CallbackRegistry`] brackets each driver-supplied callback with a
//! registration window and records whether its body ran. [`ErrorPropagation`]
//! remembers a failed registration until the probe's return value is checked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::violation::{Violation, ViolationId, ViolationLog};

/// Liveness and reachability of one callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallbackState {
    /// Inside its registration window
    pub registered: bool,
    /// Body executed at least once
    pub reached: bool,
    /// Number of invocations
    pub invocations: usize,
}

/// Callbacks keyed by name
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallbackRegistry {
    callbacks: BTreeMap<&'static str, CallbackState>,
}

impl CallbackRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the registration window
    pub fn register(&mut self, name: &'static str) {
        tracing::debug!(callback = name, "callback registered");
        self.callbacks.entry(name).or_default().registered = true;
    }

    /// Close the registration window
    pub fn deregister(&mut self, name: &'static str) {
        tracing::debug!(callback = name, "callback deregistered");
        self.callbacks.entry(name).or_default().registered = false;
    }

    /// Record that the callback body executed
    pub fn mark_reached(&mut self, name: &'static str) {
        self.callbacks.entry(name).or_default().reached = true;
    }

    /// Invoke a callback, asserting it is inside its window
    pub fn invoke(
        &mut self,
        log: &mut ViolationLog,
        name: &'static str,
        id: ViolationId,
        call: &'static str,
    ) -> Option<Violation> {
        let state = self.callbacks.entry(name).or_default();
        state.invocations += 1;
        log.check(state.registered, id, "callback registered", call, || {
            format!("{name} not registered")
        })
    }

    /// Whether the callback body ever ran
    #[must_use]
    pub fn reached(&self, name: &str) -> bool {
        self.callbacks.get(name).is_some_and(|s| s.reached)
    }

    /// Whether the callback is inside its window
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.callbacks.get(name).is_some_and(|s| s.registered)
    }

    /// State of one callback
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CallbackState> {
        self.callbacks.get(name)
    }

    /// Names of callbacks whose body ran
    #[must_use]
    pub fn reached_names(&self) -> Vec<&'static str> {
        self.callbacks
            .iter()
            .filter(|(_, s)| s.reached)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Whether no callback is inside its window
    #[must_use]
    pub fn all_closed(&self) -> bool {
        self.callbacks.values().all(|s| !s.registered)
    }

    /// Assert every window was closed
    pub fn check_closed(
        &self,
        log: &mut ViolationLog,
        id: ViolationId,
        call: &'static str,
    ) -> Vec<Violation> {
        self.callbacks
            .iter()
            .filter_map(|(name, state)| {
                log.check(!state.registered, id, "callback deregistered", call, || {
                    format!("{name} still registered")
                })
            })
            .collect()
    }
}

/// Error-propagation state between a registration and its probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeErrorFlag {
    /// No failed registration outstanding
    #[default]
    NoError,
    /// A registration failed and the probe has not returned yet
    ErrorPending,
}

/// Tracks whether a registration failure reaches the probe's return value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ErrorPropagation {
    flag: ProbeErrorFlag,
}

impl ErrorPropagation {
    /// Create with no pending error
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: ProbeErrorFlag::NoError,
        }
    }

    /// Current flag
    #[must_use]
    pub const fn flag(&self) -> ProbeErrorFlag {
        self.flag
    }

    /// Whether an error is waiting to be propagated
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.flag, ProbeErrorFlag::ErrorPending)
    }

    /// A modelled registration failed
    pub fn fail_registration(&mut self) {
        self.flag = ProbeErrorFlag::ErrorPending;
    }

    /// Forget any pending error
    pub fn reset(&mut self) {
        self.flag = ProbeErrorFlag::NoError;
    }

    /// Check the probe's return value, then reset.
    ///
    /// While an error is pending `retval` must be non-zero. The flag is
    /// cleared whether or not the check held.
    pub fn check_return_value(
        &mut self,
        log: &mut ViolationLog,
        retval: i64,
        id: ViolationId,
        call: &'static str,
    ) -> Option<Violation> {
        let raised = log.check(
            !self.is_pending() || retval != 0,
            id,
            "retval != 0 after failed registration",
            call,
            || format!("retval == {retval}"),
        );
        self.reset();
        raised
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const OUTSIDE: ViolationId = ViolationId::new("test:callback", "invoked outside registration");
    const OPEN: ViolationId = ViolationId::new("test:callback", "registration not closed at exit");
    const WRONG: ViolationId = ViolationId::new("test:register", "wrong return value");

    mod registry {
        use super::*;

        #[test]
        fn test_invoke_inside_window() {
            let mut log = ViolationLog::new();
            let mut registry = CallbackRegistry::new();
            registry.register("timer_fn");
            assert!(registry.invoke(&mut log, "timer_fn", OUTSIDE, "invoke").is_none());
            registry.mark_reached("timer_fn");
            registry.deregister("timer_fn");
            assert!(registry.reached("timer_fn"));
            assert!(!registry.is_registered("timer_fn"));
            assert!(registry.all_closed());
            assert!(registry.check_closed(&mut log, OPEN, "exit").is_empty());
            assert_eq!(registry.get("timer_fn").unwrap().invocations, 1);
        }

        #[test]
        fn test_invoke_after_deregister() {
            let mut log = ViolationLog::new();
            let mut registry = CallbackRegistry::new();
            registry.register("handler");
            assert!(!registry.all_closed());
            registry.deregister("handler");
            let raised = registry.invoke(&mut log, "handler", OUTSIDE, "invoke").unwrap();
            assert_eq!(raised.observed, "handler not registered");
        }

        #[test]
        fn test_unknown_callback_not_reached() {
            let registry = CallbackRegistry::new();
            assert!(!registry.reached("missing"));
            assert!(registry.reached_names().is_empty());
        }

        #[test]
        fn test_open_window_at_exit() {
            let mut log = ViolationLog::new();
            let mut registry = CallbackRegistry::new();
            registry.register("a");
            registry.register("b");
            registry.deregister("b");
            let raised = registry.check_closed(&mut log, OPEN, "exit");
            assert_eq!(raised.len(), 1);
            assert_eq!(raised[0].observed, "a still registered");
        }
    }

    mod propagation {
        use super::*;

        #[test]
        fn test_swallowed_error_reported() {
            let mut log = ViolationLog::new();
            let mut errors = ErrorPropagation::new();
            errors.fail_registration();
            assert!(errors.is_pending());
            let raised = errors.check_return_value(&mut log, 0, WRONG, "probe");
            assert!(raised.is_some());
        }

        #[test]
        fn test_propagated_error_passes() {
            let mut log = ViolationLog::new();
            let mut errors = ErrorPropagation::new();
            errors.fail_registration();
            assert!(errors.check_return_value(&mut log, -12, WRONG, "probe").is_none());
        }

        #[test]
        fn test_check_always_resets() {
            let mut log = ViolationLog::new();
            let mut errors = ErrorPropagation::new();
            errors.fail_registration();
            errors.check_return_value(&mut log, 0, WRONG, "probe");
            assert_eq!(errors.flag(), ProbeErrorFlag::NoError);
            assert!(errors.check_return_value(&mut log, 0, WRONG, "probe").is_none());
            assert_eq!(log.violation_count(), 1);
        }

        #[test]
        fn test_no_error_accepts_zero() {
            let mut log = ViolationLog::new();
            let mut errors = ErrorPropagation::new();
            assert!(errors.check_return_value(&mut log, 0, WRONG, "probe").is_none());
        }
    }
}
