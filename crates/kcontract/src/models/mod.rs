//! Intercepted kernel API catalog.
//!
//! Each submodule adds the intercepted entry points of one subsystem to
//! [`crate::Kernel`] and declares the violation identifiers it can raise.
//! The per-subsystem state lives together in [`ModelState`].

pub mod bitops;
pub mod clk;
pub mod emg;
pub mod gendisk;
pub mod module;
pub mod queue;
pub mod sysfs;
pub mod usb;

use serde::Serialize;

use crate::automaton::Automaton;
use crate::callback::{CallbackRegistry, ErrorPropagation};
use crate::counter::Counter;
use crate::violation::{Violation, ViolationId, ViolationLog};

pub use gendisk::DiskState;
pub use queue::QueueState;

/// Call name used for violations raised by the unload bookend
pub const FINAL_STATE: &str = "check_final_state";

/// State of every modelled subsystem in one scope
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelState {
    /// Disk lifecycle
    pub gendisk: Automaton<DiskState>,
    /// Request queue lifecycle
    pub queue: Automaton<QueueState>,
    /// Created sysfs groups
    pub sysfs: Counter,
    /// Module references held
    pub module_refs: Counter,
    /// Registered USB drivers
    pub usb_drivers: Counter,
    /// Failed USB registration awaiting the probe's return value
    pub usb_probe: ErrorPropagation,
    /// Outstanding coherent USB buffers
    pub usb_coherent: Counter,
    /// Enabled clocks
    pub clk: Counter,
    /// Environment callbacks
    pub callbacks: CallbackRegistry,
}

impl ModelState {
    /// Assert every automaton is idle and every counter is zero
    pub(crate) fn check_final(&self, log: &mut ViolationLog) -> Vec<Violation> {
        let counters: [(&Counter, ViolationId); 5] = [
            (&self.sysfs, sysfs::MORE_AT_EXIT),
            (&self.module_refs, module::MORE_AT_EXIT),
            (&self.usb_drivers, usb::REGISTER_MORE_AT_EXIT),
            (&self.usb_coherent, usb::COHERENT_MORE_AT_EXIT),
            (&self.clk, clk::MORE_AT_EXIT),
        ];

        let mut raised = Vec::new();
        raised.extend(self.gendisk.check_idle(log, gendisk::MORE_AT_EXIT, FINAL_STATE));
        raised.extend(self.queue.check_idle(log, queue::MORE_AT_EXIT, FINAL_STATE));
        for (counter, id) in counters {
            raised.extend(counter.check_zero(log, id, FINAL_STATE));
        }
        raised.extend(
            self.callbacks
                .check_closed(log, emg::NOT_CLOSED_AT_EXIT, FINAL_STATE),
        );
        raised
    }

    /// Whether every model is back at its idle value: automata idle,
    /// counters zero, callback windows closed and no registration failure
    /// awaiting the probe's return value
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.gendisk.is_idle()
            && self.queue.is_idle()
            && self.sysfs.is_zero()
            && self.module_refs.is_zero()
            && self.usb_drivers.is_zero()
            && self.usb_coherent.is_zero()
            && self.clk.is_zero()
            && self.callbacks.all_closed()
            && !self.usb_probe.is_pending()
    }
}

/// Every identifier the catalog can raise, in catalog order
#[must_use]
pub fn catalog() -> Vec<ViolationId> {
    vec![
        gendisk::DOUBLE_ALLOCATION,
        gendisk::USE_BEFORE_ALLOCATION,
        gendisk::DELETE_BEFORE_ADD,
        gendisk::FREE_BEFORE_ALLOCATION,
        gendisk::FREE_BEFORE_DELETE,
        gendisk::MORE_AT_EXIT,
        queue::DOUBLE_ALLOCATION,
        queue::USE_BEFORE_ALLOCATION,
        queue::MORE_AT_EXIT,
        sysfs::LESS_DECREMENT,
        sysfs::MORE_AT_EXIT,
        module::LESS_DECREMENT,
        module::MORE_AT_EXIT,
        usb::WRONG_RETURN_VALUE,
        usb::DEREGISTER_BEFORE_REGISTER,
        usb::REGISTER_MORE_AT_EXIT,
        usb::COHERENT_LESS_DECREMENT,
        usb::COHERENT_MORE_AT_EXIT,
        clk::LESS_DECREMENT,
        clk::MORE_AT_EXIT,
        bitops::OFFSET_OUT_OF_RANGE,
        emg::INVOKED_OUTSIDE_REGISTRATION,
        emg::NOT_CLOSED_AT_EXIT,
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let ids = catalog();
        let rendered: HashSet<String> = ids.iter().map(ViolationId::render).collect();
        assert_eq!(rendered.len(), ids.len());
    }

    #[test]
    fn test_fresh_state_passes_final_check() {
        let mut log = ViolationLog::new();
        let state = ModelState::default();
        assert!(state.is_idle());
        assert!(state.check_final(&mut log).is_empty());
        assert!(log.check_count() >= 7);
    }

    #[test]
    fn test_open_window_or_pending_usb_error_is_not_idle() {
        let mut state = ModelState::default();
        state.callbacks.register("timer_fn");
        assert!(!state.is_idle());
        state.callbacks.deregister("timer_fn");
        assert!(state.is_idle());

        state.usb_probe.fail_registration();
        assert!(!state.is_idle());
        state.usb_probe.reset();
        assert!(state.is_idle());
    }

    #[test]
    fn test_final_check_names_each_leak() {
        let mut log = ViolationLog::new();
        let mut state = ModelState::default();
        state.sysfs.increment();
        state.clk.increment();
        let raised = state.check_final(&mut log);
        let ids: Vec<_> = raised.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![sysfs::MORE_AT_EXIT, clk::MORE_AT_EXIT]);
        assert!(raised.iter().all(|v| v.call == FINAL_STATE));
    }
}
