//! Resource Automaton
//!
//! A resource's lifecycle is an ordered list of stages, idle first. Every
//! transition checks the stage it expects to start from. A call out of order
//! is reported and leaves the state where it was; a legal call moves exactly
//! one stage. Fallible transitions are coupled to their outcome: only a
//! successful outcome moves the state.

use serde::Serialize;
use std::fmt;

use crate::violation::{Violation, ViolationId, ViolationLog};

/// Stage enumeration of one resource kind
pub trait AutomatonState: Copy + Eq + fmt::Debug + Serialize + 'static {
    /// Resource kind name used in traces
    const KIND: &'static str;
    /// Idle stage at load and required at unload
    const IDLE: Self;
    /// Ordered stages, `IDLE` first
    const STAGES: &'static [Self];
}

/// Lifecycle automaton for one resource kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Automaton<S: AutomatonState> {
    state: S,
    transitions: usize,
}

impl<S: AutomatonState> Default for Automaton<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AutomatonState> Automaton<S> {
    /// Create in the idle stage
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: S::IDLE,
            transitions: 0,
        }
    }

    /// Current stage
    #[must_use]
    pub const fn state(&self) -> S {
        self.state
    }

    /// Whether the resource is idle
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == S::IDLE
    }

    /// Number of state changes so far
    #[must_use]
    pub const fn transitions(&self) -> usize {
        self.transitions
    }

    fn position(stage: S) -> usize {
        S::STAGES.iter().position(|s| *s == stage).unwrap_or(0)
    }

    fn next_of(stage: S) -> S {
        S::STAGES
            .get(Self::position(stage) + 1)
            .copied()
            .unwrap_or(stage)
    }

    fn prev_of(stage: S) -> S {
        Self::position(stage)
            .checked_sub(1)
            .and_then(|i| S::STAGES.get(i))
            .copied()
            .unwrap_or(stage)
    }

    fn observed(&self) -> String {
        format!("{}::{:?}", S::KIND, self.state)
    }

    fn step_from(&mut self, from: S, to: S, call: &'static str) {
        if self.state == from {
            self.move_to(to, call);
        }
    }

    fn move_to(&mut self, to: S, call: &'static str) {
        if to != self.state {
            tracing::debug!(kind = S::KIND, from = ?self.state, to = ?to, call, "transition");
            self.state = to;
            self.transitions += 1;
        }
    }

    /// Assert the current stage is one of `legal` without moving
    pub fn require(
        &self,
        log: &mut ViolationLog,
        legal: &[S],
        id: ViolationId,
        predicate: &'static str,
        call: &'static str,
    ) -> Option<Violation> {
        log.check(legal.contains(&self.state), id, predicate, call, || {
            self.observed()
        })
    }

    /// Move one stage forward from `from`; out of order leaves the state
    pub fn advance(
        &mut self,
        log: &mut ViolationLog,
        from: S,
        id: ViolationId,
        predicate: &'static str,
        call: &'static str,
    ) -> Option<Violation> {
        let raised = self.require(log, &[from], id, predicate, call);
        self.step_from(from, Self::next_of(from), call);
        raised
    }

    /// Move one stage back from `from`; out of order leaves the state
    pub fn retreat(
        &mut self,
        log: &mut ViolationLog,
        from: S,
        id: ViolationId,
        predicate: &'static str,
        call: &'static str,
    ) -> Option<Violation> {
        let raised = self.require(log, &[from], id, predicate, call);
        self.step_from(from, Self::prev_of(from), call);
        raised
    }

    /// Forward transition whose effect depends on the call's outcome.
    ///
    /// The precondition is checked regardless; the state only moves when
    /// `succeeded` is true and the resource was at `from`.
    pub fn acquire(
        &mut self,
        log: &mut ViolationLog,
        from: S,
        succeeded: bool,
        id: ViolationId,
        predicate: &'static str,
        call: &'static str,
    ) -> Option<Violation> {
        let raised = self.require(log, &[from], id, predicate, call);
        if succeeded {
            self.step_from(from, Self::next_of(from), call);
        }
        raised
    }

    /// Drop straight back to idle, whatever the current stage.
    ///
    /// For final teardown calls whose legality the caller has already
    /// checked with [`Automaton::require`].
    pub fn release(&mut self, call: &'static str) {
        self.move_to(S::IDLE, call);
    }

    /// Assert the resource is back to idle
    pub fn check_idle(
        &self,
        log: &mut ViolationLog,
        id: ViolationId,
        call: &'static str,
    ) -> Option<Violation> {
        log.check(self.is_idle(), id, "state == IDLE", call, || self.observed())
    }
}
