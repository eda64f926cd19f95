//! Path exploration.
//!
//! Stands in for the verification engine when the harness is exercised on
//! its own. [`Explorer::explore`] enumerates every combination of
//! representative choices depth-first; [`Explorer::fuzz`] samples paths
//! from a seed. Each path gets a fresh [`Kernel`], so paths share nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::assume::PathResult;
use crate::config::HarnessConfig;
use crate::kernel::Kernel;
use crate::nondet::{Choice, Oracle};
use crate::oracle::{ReplayOracle, ScriptedOracle, Seed, SeededOracle};
use crate::result::{ContractError, ContractResult};
use crate::validator::{PathOutcome, RunReport};
use crate::violation::ViolationId;

/// Code under test: runs the module's init and exit against a kernel
pub trait Driver {
    /// Run one path
    fn run(&self, kernel: &mut Kernel) -> PathResult<()>;
}

impl<F> Driver for F
where
    F: Fn(&mut Kernel) -> PathResult<()>,
{
    fn run(&self, kernel: &mut Kernel) -> PathResult<()> {
        self(kernel)
    }
}

/// How the paths of a report were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Strategy {
    /// Every representative choice sequence
    Exhaustive,
    /// Seeded random sampling
    Seeded {
        /// Base seed
        seed: u64,
    },
    /// A single scripted path
    Replay,
}

/// Result of exploring one driver
#[derive(Debug, Clone, Serialize)]
pub struct ExplorationReport {
    /// Unique id of this exploration
    pub run_id: Uuid,
    /// When exploration started
    pub started_at: DateTime<Utc>,
    /// How paths were chosen
    pub strategy: Strategy,
    /// Every explored path
    pub paths: Vec<RunReport>,
    /// The path budget ran out before the space was covered
    pub truncated: bool,
}

impl ExplorationReport {
    fn new(strategy: Strategy) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            strategy,
            paths: Vec::new(),
            truncated: false,
        }
    }

    /// Number of paths run
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Paths with the given outcome
    #[must_use]
    pub fn count(&self, outcome: PathOutcome) -> usize {
        self.paths.iter().filter(|p| p.outcome == outcome).count()
    }

    /// Paths cut before the unload bookend
    #[must_use]
    pub fn pruned(&self) -> usize {
        self.paths.len() - self.count(PathOutcome::Completed)
    }

    /// Every distinct violation id, sorted
    #[must_use]
    pub fn violation_ids(&self) -> BTreeSet<ViolationId> {
        self.paths
            .iter()
            .flat_map(|p| p.violations.iter().map(|v| v.id))
            .collect()
    }

    /// Paths with at least one violation
    #[must_use]
    pub fn violating_paths(&self) -> usize {
        self.paths.iter().filter(|p| !p.is_safe()).count()
    }

    /// No violation on any path
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.paths.iter().all(RunReport::is_safe)
    }

    /// First path that raised `id`
    #[must_use]
    pub fn counterexample(&self, id: ViolationId) -> Option<&RunReport> {
        self.paths.iter().find(|p| p.contains(id))
    }

    /// Callbacks reached on any path
    #[must_use]
    pub fn reached(&self) -> BTreeSet<&'static str> {
        self.paths
            .iter()
            .flat_map(|p| p.reached.iter().copied())
            .collect()
    }
}

/// Runs drivers over many paths
#[derive(Debug, Clone, Default)]
pub struct Explorer {
    config: HarnessConfig,
}

impl Explorer {
    /// Create with a configuration
    #[must_use]
    pub const fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Run one path of `driver` against `oracle`
    pub fn run_path(&self, driver: &impl Driver, oracle: impl Oracle + 'static) -> RunReport {
        let mut kernel = Kernel::new(oracle).with_mode(self.config.mode);
        let result = kernel
            .initialize()
            .and_then(|_| driver.run(&mut kernel));
        kernel.finish(result)
    }

    /// Run a single path from a choice script
    pub fn replay(&self, driver: &impl Driver, script: Vec<Choice>) -> ExplorationReport {
        let mut report = ExplorationReport::new(Strategy::Replay);
        report
            .paths
            .push(self.run_path(driver, ScriptedOracle::new(script)));
        report
    }

    /// Enumerate every representative choice sequence
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Config`] for an invalid configuration, and
    /// [`ContractError::BudgetExhausted`] when the path budget runs out and
    /// `strict_budget` is set.
    pub fn explore(&self, driver: &impl Driver) -> ContractResult<ExplorationReport> {
        self.explore_with(driver, |_, _| {})
    }

    /// [`Explorer::explore`] with a callback after each path
    ///
    /// # Errors
    ///
    /// See [`Explorer::explore`].
    pub fn explore_with(
        &self,
        driver: &impl Driver,
        mut on_path: impl FnMut(usize, &RunReport),
    ) -> ContractResult<ExplorationReport> {
        self.config.validate()?;
        let bounds = &self.config.exploration;
        let mut report = ExplorationReport::new(Strategy::Exhaustive);
        let mut prefix = Vec::new();

        loop {
            if report.paths.len() >= bounds.max_paths {
                report.truncated = true;
                break;
            }
            let path = self.run_path(driver, ReplayOracle::new(prefix.clone()));
            on_path(report.paths.len(), &path);
            let next = next_prefix(&prefix, &path, bounds.max_choices);
            report.paths.push(path);
            match next {
                Some(next) => prefix = next,
                None => break,
            }
        }

        if report.truncated && bounds.strict_budget {
            return Err(ContractError::BudgetExhausted {
                paths: report.paths.len(),
            });
        }
        tracing::info!(
            paths = report.path_count(),
            pruned = report.pruned(),
            violating = report.violating_paths(),
            truncated = report.truncated,
            "exploration finished"
        );
        Ok(report)
    }

    /// Run `runs` seeded random paths
    pub fn fuzz(&self, driver: &impl Driver, seed: Seed, runs: usize) -> ExplorationReport {
        self.fuzz_with(driver, seed, runs, |_, _| {})
    }

    /// [`Explorer::fuzz`] with a callback after each run
    pub fn fuzz_with(
        &self,
        driver: &impl Driver,
        seed: Seed,
        runs: usize,
        mut on_path: impl FnMut(usize, &RunReport),
    ) -> ExplorationReport {
        let mut report = ExplorationReport::new(Strategy::Seeded { seed: seed.value() });
        for n in 0..runs {
            let path = self.run_path(driver, SeededOracle::new(seed.derive(n as u64)));
            on_path(n, &path);
            report.paths.push(path);
        }
        tracing::info!(
            runs,
            seed = seed.value(),
            violating = report.violating_paths(),
            "fuzzing finished"
        );
        report
    }
}

/// Next prefix in depth-first order, or `None` when the space is covered.
///
/// Bumps the deepest choice (within `max_choices`) that still has an
/// untried representative and drops everything after it.
fn next_prefix(prefix: &[usize], path: &RunReport, max_choices: usize) -> Option<Vec<usize>> {
    let depth = path.choices.len().min(max_choices);
    (0..depth).rev().find_map(|i| {
        let taken = prefix.get(i).copied().unwrap_or(0);
        let width = path.choices[i].kind.representatives().len();
        (taken + 1 < width).then(|| {
            let mut next: Vec<usize> = (0..i).map(|j| prefix.get(j).copied().unwrap_or(0)).collect();
            next.push(taken + 1);
            next
        })
    })
}
