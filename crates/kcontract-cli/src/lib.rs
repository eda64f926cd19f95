//! kcontract CLI Library
//!
//! Command-line interface over the kcontract scenario catalog: list the
//! built-in drivers, explore or fuzz them, and replay counterexamples.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ExploreArgs, FormatArg, FuzzArgs, ListArgs, ReplayArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_exploration, render_run, render_scenarios, OutputFormat, ProgressReporter};
pub use runner::Runner;
