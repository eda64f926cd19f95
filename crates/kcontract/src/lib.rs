//! kcontract: Kernel API Usage Contracts for Driver Verification
//!
//! Stand-in implementations of kernel API functions that track how a driver
//! uses each resource, report misuse through a single reporter, and check at
//! unload that everything acquired was released. Results that the real kernel
//! decides at run time (allocation failure, error codes, NULL pointers) come
//! from a nondeterministic [`Oracle`]; the [`Explorer`] drives every
//! combination of those choices for a bounded number of paths.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   KCONTRACT Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Driver     │    │ Kernel     │    │ Oracle     │            │
//! │   │ (code      │───►│ (models,   │◄───│ (scripted, │            │
//! │   │  under     │    │  counters, │    │  seeded,   │            │
//! │   │  test)     │    │  callbacks)│    │  replay)   │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                      │
//! │                           ▼                                      │
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Explorer   │◄───│ RunReport  │◄───│ Violation  │            │
//! │   │ (DFS/fuzz) │    │ (per path) │    │ Log        │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use kcontract::prelude::*;
//!
//! let driver = |k: &mut Kernel| -> PathResult<()> {
//!     if let Some(disk) = k.alloc_disk(1)?.into_value() {
//!         k.add_disk(disk)?;
//!         k.del_gendisk(disk)?;
//!         k.put_disk(Some(disk))?;
//!     }
//!     Ok(())
//! };
//!
//! let report = Explorer::new(HarnessConfig::default()).explore(&driver).unwrap();
//! assert!(report.is_safe());
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assume;
mod automaton;
mod callback;
mod config;
mod counter;
mod explorer;
mod kernel;
mod nondet;
mod oracle;
mod result;
mod validator;
mod violation;

/// Contract models for each intercepted kernel API family
pub mod models;

/// Built-in driver scenarios with known verdicts
pub mod scenarios;

/// Proptest strategies over choices and scripts
#[allow(clippy::missing_const_for_fn)]
pub mod strategies;

pub use assume::{assume, PathResult, PruneKind, Pruned};
pub use automaton::{Automaton, AutomatonState};
pub use callback::{CallbackRegistry, CallbackState, ErrorPropagation, ProbeErrorFlag};
pub use config::{ExplorationConfig, FuzzConfig, HarnessConfig};
pub use counter::Counter;
pub use explorer::{Driver, ExplorationReport, Explorer, Strategy};
pub use kernel::{Intercepted, Kernel};
pub use nondet::{
    parse_script, Choice, ChoiceKind, ChoiceRecord, Handle, Nondet, Oracle, EINVAL, ENOMEM,
};
pub use oracle::{ReplayOracle, ScriptedOracle, Seed, SeededOracle};
pub use result::{ContractError, ContractResult};
pub use validator::{fingerprint, PathOutcome, RunReport};
pub use violation::{
    ReportMode, Violation, ViolationError, ViolationId, ViolationLog, ViolationSummary,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assume::{assume, PathResult, PruneKind, Pruned};
    pub use super::config::HarnessConfig;
    pub use super::explorer::{Driver, ExplorationReport, Explorer};
    pub use super::kernel::{Intercepted, Kernel};
    pub use super::models::{DiskState, QueueState};
    pub use super::nondet::{Choice, ChoiceKind, Handle, Oracle, EINVAL, ENOMEM};
    pub use super::oracle::{ReplayOracle, ScriptedOracle, Seed, SeededOracle};
    pub use super::result::{ContractError, ContractResult};
    pub use super::scenarios::{Expected, Scenario};
    pub use super::validator::{PathOutcome, RunReport};
    pub use super::violation::{ReportMode, Violation, ViolationId};
}
