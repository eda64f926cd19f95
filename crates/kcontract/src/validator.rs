//! Load/unload bookends and per-path reports.
//!
//! The engine calls [`Kernel::initialize`] before the code under test runs
//! and [`Kernel::check_final_state`] once after it returns. Neither is part
//! of the intercepted API. [`Kernel::finish`] seals the path into a
//! [`RunReport`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::assume::{PathResult, PruneKind, Pruned};
use crate::kernel::Kernel;
use crate::nondet::{Choice, ChoiceRecord};
use crate::violation::{Violation, ViolationId, ViolationSummary};

/// How a path ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathOutcome {
    /// Ran to the unload bookend
    Completed,
    /// Cut by an assumption; never happens in reality
    Infeasible,
    /// Left the module mid-path
    Exited,
    /// Stopped at the first violation in fail-fast mode
    Aborted,
}

impl From<PruneKind> for PathOutcome {
    fn from(kind: PruneKind) -> Self {
        match kind {
            PruneKind::Infeasible => Self::Infeasible,
            PruneKind::Exited => Self::Exited,
            PruneKind::Aborted => Self::Aborted,
        }
    }
}

/// Everything observed on one explored path
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// How the path ended
    pub outcome: PathOutcome,
    /// Assumption or event that cut the path
    pub cut: Option<Pruned>,
    /// Violations in the order they were raised
    pub violations: Vec<Violation>,
    /// Every nondeterministic choice taken
    pub choices: Vec<ChoiceRecord>,
    /// Check counts
    pub summary: ViolationSummary,
    /// Callbacks whose body ran
    pub reached: Vec<&'static str>,
    /// Oracle that answered the choices
    pub oracle: &'static str,
    /// SHA-256 of the choice trace
    pub fingerprint: String,
}

impl RunReport {
    /// No violation on this path
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether this path raised `id`
    #[must_use]
    pub fn contains(&self, id: ViolationId) -> bool {
        self.violations.iter().any(|v| v.id == id)
    }

    /// Choice values, replayable with a scripted oracle
    #[must_use]
    pub fn script(&self) -> Vec<Choice> {
        self.choices.iter().map(|c| c.value).collect()
    }

    /// Choice values as a comma-separated script
    #[must_use]
    pub fn script_string(&self) -> String {
        self.choices
            .iter()
            .map(|c| c.value.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// SHA-256 over a choice trace
#[must_use]
pub fn fingerprint(choices: &[ChoiceRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in choices {
        hasher.update(format!("{:?}={};", record.kind, record.value).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

impl Kernel {
    /// Load bookend: choose the CPU count, assuming at least one CPU
    pub fn initialize(&mut self) -> PathResult<u64> {
        let nr_cpu_ids = self.any_uint();
        self.assume(nr_cpu_ids > 0, "nr_cpu_ids > 0")?;
        self.nr_cpu_ids = Some(nr_cpu_ids);
        Ok(nr_cpu_ids)
    }

    /// Unload bookend: every automaton idle, every counter zero.
    ///
    /// Runs once per scope; later calls raise nothing.
    pub fn check_final_state(&mut self) -> Vec<Violation> {
        if self.final_checked {
            tracing::warn!("final state already checked");
            return Vec::new();
        }
        self.final_checked = true;
        let raised = self.models.check_final(&mut self.log);
        tracing::debug!(violations = raised.len(), "final state checked");
        raised
    }

    /// Seal the path.
    ///
    /// A completed path that has not been through
    /// [`Kernel::check_final_state`] gets the check here.
    pub fn finish(mut self, result: PathResult<()>) -> RunReport {
        let outcome = match result {
            Ok(()) => {
                if !self.final_checked {
                    self.check_final_state();
                }
                PathOutcome::Completed
            }
            Err(cut) => {
                self.mark_pruned(cut);
                cut.kind.into()
            }
        };
        let summary = self.log.summary();
        let reached = self.models.callbacks.reached_names();
        let oracle = self.oracle_name();
        let choices = self.trace().to_vec();
        RunReport {
            outcome,
            cut: self.pruned(),
            violations: self.log.take(),
            fingerprint: fingerprint(&choices),
            choices,
            summary,
            reached,
            oracle,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{gendisk, sysfs};
    use crate::nondet::ChoiceKind;

    mod bookends {
        use super::*;

        #[test]
        fn test_initialize_picks_cpus() {
            let mut kernel = Kernel::scripted([Choice::UInt(4)]);
            assert_eq!(kernel.initialize().unwrap(), 4);
            assert_eq!(kernel.nr_cpu_ids(), Some(4));
        }

        #[test]
        fn test_zero_cpus_infeasible() {
            let mut kernel = Kernel::scripted([Choice::UInt(0)]);
            let cut = kernel.initialize().unwrap_err();
            assert_eq!(cut.kind, PruneKind::Infeasible);
            assert!(kernel.violations().is_empty());
        }

        #[test]
        fn test_untouched_kernel_passes() {
            let mut kernel = Kernel::scripted([]);
            assert!(kernel.check_final_state().is_empty());
        }

        #[test]
        fn test_leak_found_only_at_exit() {
            let mut kernel = Kernel::scripted([Choice::Bool(true)]);
            let out = kernel.alloc_disk(1).unwrap();
            assert!(out.is_clean());
            let raised = kernel.check_final_state();
            assert_eq!(raised.len(), 1);
            assert_eq!(raised[0].id, gendisk::MORE_AT_EXIT);
        }

        #[test]
        fn test_check_runs_once() {
            let mut kernel = Kernel::scripted([Choice::Bool(true)]);
            kernel.alloc_disk(1).unwrap();
            assert_eq!(kernel.check_final_state().len(), 1);
            assert!(kernel.check_final_state().is_empty());
            assert_eq!(kernel.violations().len(), 1);
        }
    }

    mod reports {
        use super::*;

        #[test]
        fn test_finish_runs_final_check() {
            let mut kernel = Kernel::scripted([Choice::Int(0)]);
            let kobj = kernel.fresh_handle();
            kernel.sysfs_create_group(kobj, kobj).unwrap();
            let report = kernel.finish(Ok(()));
            assert_eq!(report.outcome, PathOutcome::Completed);
            assert!(report.contains(sysfs::MORE_AT_EXIT));
            assert!(!report.is_safe());
        }

        #[test]
        fn test_pruned_path_skips_final_check() {
            let mut kernel = Kernel::scripted([Choice::Bool(true), Choice::UInt(0)]);
            kernel.alloc_disk(1).unwrap();
            let result = kernel.initialize().map(|_| ());
            let report = kernel.finish(result);
            assert_eq!(report.outcome, PathOutcome::Infeasible);
            assert!(report.is_safe());
            assert_eq!(report.cut.unwrap().reason, "nr_cpu_ids > 0");
        }

        #[test]
        fn test_script_round_trip() {
            let mut kernel = Kernel::scripted([Choice::Bool(false), Choice::Int(-12)]);
            kernel.any_ptr();
            kernel.any_int_negative();
            let report = kernel.finish(Ok(()));
            assert_eq!(report.script_string(), "false,-12");
            assert_eq!(report.script(), vec![Choice::Bool(false), Choice::Int(-12)]);
            assert_eq!(report.oracle, "scripted");
        }

        #[test]
        fn test_fingerprint_stable_and_distinct() {
            let a = [ChoiceRecord {
                kind: ChoiceKind::Nullable,
                value: Choice::Bool(true),
            }];
            let b = [ChoiceRecord {
                kind: ChoiceKind::Nullable,
                value: Choice::Bool(false),
            }];
            assert_eq!(fingerprint(&a), fingerprint(&a));
            assert_ne!(fingerprint(&a), fingerprint(&b));
            assert_eq!(fingerprint(&[]).len(), 64);
        }

        #[test]
        fn test_report_serializes() {
            let kernel = Kernel::scripted([]);
            let report = kernel.finish(Ok(()));
            let json = serde_json::to_string(&report).unwrap();
            assert!(json.contains("\"outcome\":\"completed\""));
        }
    }
}
