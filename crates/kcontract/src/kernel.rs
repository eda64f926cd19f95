//! Model context.
//!
//! [`Kernel`] is one simulated load/unload scope. It owns the oracle, the
//! violation log, the choice trace and every subsystem model, and is passed
//! by `&mut` into each intercepted call. Separate instances share nothing, so
//! exploration paths can run side by side.

use std::num::NonZeroU64;

use crate::assume::{PathResult, Pruned};
use crate::models::ModelState;
use crate::nondet::{Choice, ChoiceKind, ChoiceRecord, Handle, Nondet, Oracle};
use crate::oracle::ScriptedOracle;
use crate::violation::{ReportMode, Violation, ViolationId, ViolationLog};

/// Outcome of one intercepted call with the violations it raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intercepted<T> {
    /// Value returned to the code under test
    pub value: T,
    /// Violations raised by this call, in order
    pub violations: Vec<Violation>,
}

impl<T> Intercepted<T> {
    /// Whether the call raised nothing
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether the call raised `id`
    #[must_use]
    pub fn raised(&self, id: ViolationId) -> bool {
        self.violations.iter().any(|v| v.id == id)
    }

    /// Discard the violations and keep the value
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Simulated kernel: the context every intercepted call runs against
#[derive(Debug)]
pub struct Kernel {
    oracle: Box<dyn Oracle>,
    pub(crate) log: ViolationLog,
    pub(crate) models: ModelState,
    trace: Vec<ChoiceRecord>,
    handles: u64,
    pruned: Option<Pruned>,
    pub(crate) nr_cpu_ids: Option<u64>,
    pub(crate) final_checked: bool,
}

impl Kernel {
    /// Create a fresh scope answering choices from `oracle`
    #[must_use]
    pub fn new(oracle: impl Oracle + 'static) -> Self {
        Self {
            oracle: Box::new(oracle),
            log: ViolationLog::new(),
            models: ModelState::default(),
            trace: Vec::new(),
            handles: 0,
            pruned: None,
            nr_cpu_ids: None,
            final_checked: false,
        }
    }

    /// Create a scope driven by a fixed choice script
    #[must_use]
    pub fn scripted(script: impl IntoIterator<Item = Choice>) -> Self {
        Self::new(ScriptedOracle::new(script))
    }

    /// Set the reporting mode
    #[must_use]
    pub fn with_mode(mut self, mode: ReportMode) -> Self {
        self.log = ViolationLog::with_mode(mode);
        self
    }

    /// Name of the oracle answering choices
    #[must_use]
    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }

    /// Violation log of this scope
    #[must_use]
    pub const fn log(&self) -> &ViolationLog {
        &self.log
    }

    /// Every violation raised so far
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        self.log.violations()
    }

    /// Choices taken so far
    #[must_use]
    pub fn trace(&self) -> &[ChoiceRecord] {
        &self.trace
    }

    /// Subsystem models
    #[must_use]
    pub const fn models(&self) -> &ModelState {
        &self.models
    }

    /// Why the path was cut, if it was
    #[must_use]
    pub const fn pruned(&self) -> Option<Pruned> {
        self.pruned
    }

    /// Number of CPUs chosen at load, once initialized
    #[must_use]
    pub const fn nr_cpu_ids(&self) -> Option<u64> {
        self.nr_cpu_ids
    }

    /// Ask the oracle for a value and record it
    pub fn choose(&mut self, kind: ChoiceKind) -> Choice {
        let value = self.oracle.choose(kind);
        tracing::trace!(?kind, %value, step = self.trace.len(), "choice");
        self.trace.push(ChoiceRecord { kind, value });
        value
    }

    /// Arbitrary boolean
    pub fn any_bool(&mut self) -> bool {
        self.choose(ChoiceKind::Bool).as_bool()
    }

    /// Arbitrary signed integer
    pub fn any_int(&mut self) -> i64 {
        self.choose(ChoiceKind::Int).as_i64()
    }

    /// Zero or a negative error code
    pub fn any_int_nonpositive(&mut self) -> i64 {
        self.choose(ChoiceKind::IntNonPositive).as_i64()
    }

    /// A negative error code
    pub fn any_int_negative(&mut self) -> i64 {
        self.choose(ChoiceKind::IntNegative).as_i64()
    }

    /// Arbitrary unsigned integer
    pub fn any_uint(&mut self) -> u64 {
        self.choose(ChoiceKind::UInt).as_u64()
    }

    /// A pointer that may be null
    pub fn any_ptr(&mut self) -> Option<Handle> {
        if self.choose(ChoiceKind::Nullable).as_bool() {
            Some(self.fresh_handle())
        } else {
            None
        }
    }

    /// A non-null pointer; the null branch is pruned
    pub fn any_nonnull_ptr(&mut self) -> PathResult<Handle> {
        let ptr = self.any_ptr();
        self.assume(ptr.is_some(), "ptr != NULL")?;
        ptr.ok_or(Pruned::infeasible("ptr != NULL"))
    }

    /// Arbitrary value of any [`Nondet`] type
    pub fn any_value<T: Nondet>(&mut self) -> T {
        T::any(self)
    }

    /// A handle never returned before in this scope
    pub fn fresh_handle(&mut self) -> Handle {
        self.handles += 1;
        Handle::new(NonZeroU64::MIN.saturating_add(self.handles - 1))
    }

    /// Keep the path only if `predicate` holds
    pub fn assume(&mut self, predicate: bool, reason: &'static str) -> PathResult<()> {
        crate::assume::assume(predicate, reason).map_err(|cut| {
            self.mark_pruned(cut);
            cut
        })
    }

    pub(crate) fn mark_pruned(&mut self, cut: Pruned) {
        if self.pruned.is_none() {
            tracing::debug!(%cut, "path cut");
            self.pruned = Some(cut);
        }
    }

    /// Run an intercepted call body and gather the violations it raised.
    ///
    /// In fail-fast mode a call that raised a violation cuts the path.
    pub(crate) fn intercept<T>(
        &mut self,
        call: &'static str,
        body: impl FnOnce(&mut Self) -> PathResult<T>,
    ) -> PathResult<Intercepted<T>> {
        let mark = self.log.violation_count();
        let value = match body(self) {
            Ok(value) => value,
            Err(cut) => {
                self.mark_pruned(cut);
                return Err(cut);
            }
        };
        let violations = self.log.since(mark).to_vec();
        if self.log.is_halted() && !violations.is_empty() {
            let cut = Pruned::aborted(call);
            self.mark_pruned(cut);
            return Err(cut);
        }
        Ok(Intercepted { value, violations })
    }

    /// Acquire a spinlock; modelled as a pass-through
    pub fn spin_lock(&mut self, _lock: Handle) {}

    /// Release a spinlock; modelled as a pass-through
    pub fn spin_unlock(&mut self, _lock: Handle) {}

    /// Acquire a mutex; modelled as a pass-through
    pub fn mutex_lock(&mut self, _lock: Handle) {}

    /// Release a mutex; modelled as a pass-through
    pub fn mutex_unlock(&mut self, _lock: Handle) {}
}
