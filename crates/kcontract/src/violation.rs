//! Violation Reporter
//!
//! Collects broken contract preconditions without stopping the path, the way
//! soft assertions collect failures: every check is counted, every failure is
//! kept with enough context to triage it, and `verify()` turns the collection
//! into a single error when a caller wants one.
//!
//! Identifiers are rendered as `subsystem::description` and are a stable
//! reporting format; downstream triage matches on the exact string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one (resource, precondition) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ViolationId {
    /// Subsystem path, e.g. `linux:gendisk`
    pub subsystem: &'static str,
    /// Short description, e.g. `double allocation`
    pub description: &'static str,
}

impl ViolationId {
    /// Create an identifier
    #[must_use]
    pub const fn new(subsystem: &'static str, description: &'static str) -> Self {
        Self {
            subsystem,
            description,
        }
    }

    /// Render as `subsystem::description`
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ViolationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.subsystem, self.description)
    }
}

/// A single broken precondition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Stable identifier
    pub id: ViolationId,
    /// The predicate that failed, e.g. `state == NoDisk`
    pub predicate: &'static str,
    /// Intercepted call that raised it
    pub call: &'static str,
    /// Model state observed when the check failed
    pub observed: String,
    /// Index of this violation in the run
    pub seq: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}: expected {}, observed {}",
            self.id, self.call, self.predicate, self.observed
        )
    }
}

/// How the reporter reacts to a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    /// Keep exploring and collect every violation on the path (default)
    #[default]
    Collect,
    /// Keep only the first violation; the path is reported as aborted
    FailFast,
}

/// Per-run violation collector
#[derive(Debug, Default)]
pub struct ViolationLog {
    violations: Vec<Violation>,
    mode: ReportMode,
    checks: usize,
    halted: bool,
}

impl ViolationLog {
    /// Create an empty log in collect mode
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a specific mode
    #[must_use]
    pub fn with_mode(mode: ReportMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check `holds`; on failure record a violation and return a copy of it.
    ///
    /// `observed` is only rendered when the check fails.
    pub fn check(
        &mut self,
        holds: bool,
        id: ViolationId,
        predicate: &'static str,
        call: &'static str,
        observed: impl FnOnce() -> String,
    ) -> Option<Violation> {
        self.checks += 1;
        if holds || self.halted {
            return None;
        }

        let violation = Violation {
            id,
            predicate,
            call,
            observed: observed(),
            seq: self.violations.len(),
        };
        tracing::warn!(
            violation = %violation.id,
            call,
            predicate,
            observed = %violation.observed,
            "contract violation"
        );
        self.violations.push(violation.clone());
        if self.mode == ReportMode::FailFast {
            self.halted = true;
        }
        Some(violation)
    }

    /// All violations recorded so far
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations recorded at or after `seq`
    #[must_use]
    pub fn since(&self, seq: usize) -> &[Violation] {
        self.violations.get(seq..).unwrap_or(&[])
    }

    /// Number of violations
    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Number of checks evaluated
    #[must_use]
    pub const fn check_count(&self) -> usize {
        self.checks
    }

    /// Whether a fail-fast log has stopped recording
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Reporting mode
    #[must_use]
    pub const fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Whether any violation with this identifier was raised
    #[must_use]
    pub fn contains(&self, id: ViolationId) -> bool {
        self.violations.iter().any(|v| v.id == id)
    }

    /// Whether every check passed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Verify no violation was raised
    ///
    /// # Errors
    ///
    /// Returns an error listing every recorded violation.
    pub fn verify(&self) -> Result<(), ViolationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ViolationError::new(&self.violations))
        }
    }

    /// Summary of checks
    #[must_use]
    pub fn summary(&self) -> ViolationSummary {
        ViolationSummary {
            checks: self.checks,
            passed: self.checks.saturating_sub(self.violations.len()),
            failed: self.violations.len(),
        }
    }

    /// Take the recorded violations, leaving the log empty
    pub fn take(&mut self) -> Vec<Violation> {
        self.halted = false;
        std::mem::take(&mut self.violations)
    }
}

/// Summary of checks in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViolationSummary {
    /// Total checks evaluated
    pub checks: usize,
    /// Checks that held
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
}

/// Error carrying every violation of a run
#[derive(Debug, Clone)]
pub struct ViolationError {
    /// Rendered violations
    pub violations: Vec<String>,
    /// Number of violations
    pub count: usize,
}

impl ViolationError {
    /// Create from recorded violations
    #[must_use]
    pub fn new(violations: &[Violation]) -> Self {
        Self {
            violations: violations.iter().map(ToString::to_string).collect(),
            count: violations.len(),
        }
    }
}

impl fmt::Display for ViolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} contract violation(s):", self.count)?;
        for (i, violation) in self.violations.iter().enumerate() {
            writeln!(f, "  {}. {violation}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ViolationError {}
