//! kcontract CLI: explore kernel API usage contracts
//!
//! ## Usage
//!
//! ```bash
//! kcontract list                              # Built-in scenarios
//! kcontract explore gendisk_double_add        # Every representative path
//! kcontract explore --all --format json       # Whole catalog as JSON
//! kcontract fuzz usb_probe_swallows_error -r 500
//! kcontract replay module_refcount --script 1u,true,false
//! ```

use clap::Parser;
use kcontract_cli::{Cli, CliConfig, CliResult, Commands, Runner, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    init_tracing(&config);

    let mut runner = Runner::new(config);
    match cli.command {
        Commands::List(args) => runner.list(&args),
        Commands::Explore(args) => runner.explore(&args),
        Commands::Fuzz(args) => runner.fuzz(&args),
        Commands::Replay(args) => runner.replay(&args),
        Commands::Config(args) => runner.show_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliResult<CliConfig> {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_log_json(cli.log_json)
        .load_harness(cli.config.as_deref())
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.with_ansi(config.color.should_color()).init();
    }
}
