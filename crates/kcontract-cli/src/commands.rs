//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// kcontract: explore kernel API usage contracts over driver scenarios
#[derive(Parser, Debug)]
#[command(name = "kcontract")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Harness configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true, env = "KCONTRACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List built-in scenarios
    List(ListArgs),

    /// Explore every representative path of a scenario
    Explore(ExploreArgs),

    /// Run seeded random paths of a scenario
    Fuzz(FuzzArgs),

    /// Replay one path from a choice script
    Replay(ReplayArgs),

    /// Show the effective harness configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the explore command
#[derive(Parser, Debug)]
pub struct ExploreArgs {
    /// Scenario to explore
    #[arg(required_unless_present = "all")]
    pub scenario: Option<String>,

    /// Explore every built-in scenario
    #[arg(long, conflicts_with = "scenario")]
    pub all: bool,

    /// Maximum number of paths
    #[arg(long)]
    pub max_paths: Option<usize>,

    /// Choices per path to branch on
    #[arg(long)]
    pub max_choices: Option<usize>,

    /// Fail when the path budget runs out
    #[arg(long)]
    pub strict: bool,

    /// Stop each path at its first violation
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the fuzz command
#[derive(Parser, Debug)]
pub struct FuzzArgs {
    /// Scenario to fuzz
    pub scenario: String,

    /// Base seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of runs
    #[arg(short, long)]
    pub runs: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Scenario to replay
    pub scenario: String,

    /// Comma-separated choices, e.g. `1u,true,-12`. The first value is the
    /// CPU count chosen at load and must be a non-zero `u` value; a missing
    /// or zero count makes the path infeasible
    #[arg(short, long, allow_hyphen_values = true)]
    pub script: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
