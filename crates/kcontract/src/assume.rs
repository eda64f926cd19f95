//! Assumption filter.
//!
//! An assumption narrows the explored state space: when its predicate is
//! false the current path is infeasible and is dropped without a report.
//! Assumptions are control flow, not findings, so they travel through
//! `Result` and `?` while violations travel through the log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a path stopped before reaching the unload bookend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PruneKind {
    /// An assumption did not hold; the path never happens
    Infeasible,
    /// The code under test left the module (e.g. `module_put_and_exit`)
    Exited,
    /// Fail-fast reporting stopped the path at its first violation
    Aborted,
}

/// Marker returned when the current path is cut short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pruned {
    /// Kind of cut
    pub kind: PruneKind,
    /// Predicate or event that cut the path
    pub reason: &'static str,
}

impl Pruned {
    /// An assumption failed
    #[must_use]
    pub const fn infeasible(reason: &'static str) -> Self {
        Self {
            kind: PruneKind::Infeasible,
            reason,
        }
    }

    /// The module exited mid-path
    #[must_use]
    pub const fn exited(reason: &'static str) -> Self {
        Self {
            kind: PruneKind::Exited,
            reason,
        }
    }

    /// A violation stopped the path in fail-fast mode
    #[must_use]
    pub const fn aborted(reason: &'static str) -> Self {
        Self {
            kind: PruneKind::Aborted,
            reason,
        }
    }
}

impl fmt::Display for Pruned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PruneKind::Infeasible => write!(f, "infeasible: assumed {}", self.reason),
            PruneKind::Exited => write!(f, "exited: {}", self.reason),
            PruneKind::Aborted => write!(f, "aborted at {}", self.reason),
        }
    }
}

impl std::error::Error for Pruned {}

/// Result of code that may be cut by an assumption
pub type PathResult<T> = Result<T, Pruned>;

/// Keep the current path only if `predicate` holds.
///
/// ```
/// use kcontract::{assume, PruneKind};
///
/// assert!(assume(3 > 0, "nr_cpu_ids > 0").is_ok());
/// let cut = assume(false, "nr_cpu_ids > 0").unwrap_err();
/// assert_eq!(cut.kind, PruneKind::Infeasible);
/// ```
pub fn assume(predicate: bool, reason: &'static str) -> PathResult<()> {
    if predicate {
        Ok(())
    } else {
        tracing::trace!(reason, "path pruned by assumption");
        Err(Pruned::infeasible(reason))
    }
}
