//! Command execution over the scenario catalog

use kcontract::scenarios::{self, Expected, Scenario};
use kcontract::{parse_script, ExplorationReport, Explorer, HarnessConfig, ReportMode};
use serde::Serialize;

use crate::commands::{ConfigArgs, ExploreArgs, FuzzArgs, ListArgs, ReplayArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render_exploration, render_run, render_scenarios, OutputFormat, ProgressReporter};

/// Catalog entry as printed by `list --format json`
#[derive(Debug, Serialize)]
struct ScenarioEntry {
    name: &'static str,
    description: &'static str,
    expected: Expected,
    reaches: &'static [&'static str],
}

impl From<&Scenario> for ScenarioEntry {
    fn from(s: &Scenario) -> Self {
        Self {
            name: s.name,
            description: s.description,
            expected: s.expected,
            reaches: s.reaches,
        }
    }
}

/// Exploration result as printed by `--format json`
#[derive(Debug, Serialize)]
struct ScenarioResult<'a> {
    scenario: &'static str,
    expected: Expected,
    verdict_holds: bool,
    report: &'a ExplorationReport,
}

/// Runs CLI commands against the harness
#[derive(Debug)]
pub struct Runner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl Runner {
    /// Create a runner from the resolved configuration
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// `list`
    pub fn list(&self, args: &ListArgs) -> CliResult<()> {
        let all = scenarios::all();
        match OutputFormat::from(args.format) {
            OutputFormat::Text => print!("{}", render_scenarios(all)),
            OutputFormat::Json => {
                let entries: Vec<ScenarioEntry> = all.iter().map(ScenarioEntry::from).collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
        }
        Ok(())
    }

    /// `explore`: exits with an error when a verdict does not match
    pub fn explore(&self, args: &ExploreArgs) -> CliResult<()> {
        let harness = self.explore_config(args);
        let explorer = Explorer::new(harness);
        let selected: Vec<&'static Scenario> = if args.all {
            scenarios::all().iter().collect()
        } else {
            let name = args
                .scenario
                .as_deref()
                .ok_or_else(|| CliError::invalid_argument("scenario name or --all required"))?;
            vec![scenarios::find(name)?]
        };

        let format = OutputFormat::from(args.format);
        let mut results = Vec::with_capacity(selected.len());
        let mut mismatched = Vec::new();
        for scenario in selected {
            tracing::info!(scenario = scenario.name, "exploring");
            let report = explorer.explore(scenario)?;
            let holds = scenario.verdict_holds(&report);
            if holds {
                self.reporter
                    .success(&format!("{} matches expected verdict", scenario.name));
            } else {
                self.reporter
                    .failure(&format!("{} did not reach expected verdict", scenario.name));
                mismatched.push(scenario.name);
            }
            if format == OutputFormat::Text {
                print!(
                    "{}",
                    render_exploration(scenario.name, &report, self.reporter.use_color)
                );
            }
            results.push((scenario, holds, report));
        }

        if format == OutputFormat::Json {
            let rendered: Vec<ScenarioResult<'_>> = results
                .iter()
                .map(|(scenario, holds, report)| ScenarioResult {
                    scenario: scenario.name,
                    expected: scenario.expected,
                    verdict_holds: *holds,
                    report,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }

        if mismatched.is_empty() {
            Ok(())
        } else {
            Err(CliError::verdict_mismatch(mismatched.join(", ")))
        }
    }

    fn explore_config(&self, args: &ExploreArgs) -> HarnessConfig {
        let mut harness = self.config.harness.clone();
        if let Some(max_paths) = args.max_paths {
            harness = harness.with_max_paths(max_paths);
        }
        if let Some(max_choices) = args.max_choices {
            harness = harness.with_max_choices(max_choices);
        }
        if args.strict {
            harness = harness.with_strict_budget(true);
        }
        if args.fail_fast {
            harness = harness.with_mode(ReportMode::FailFast);
        }
        harness
    }

    /// `fuzz`
    pub fn fuzz(&mut self, args: &FuzzArgs) -> CliResult<()> {
        let mut harness = self.config.harness.clone();
        if let Some(seed) = args.seed {
            harness = harness.with_seed(seed);
        }
        if let Some(runs) = args.runs {
            harness = harness.with_runs(runs);
        }
        harness.validate()?;

        let scenario = scenarios::find(&args.scenario)?;
        let explorer = Explorer::new(harness.clone());
        self.reporter
            .start_progress(harness.fuzz.runs as u64, scenario.name);
        let reporter = &self.reporter;
        let report = explorer.fuzz_with(scenario, harness.seed(), harness.fuzz.runs, |_, _| {
            reporter.increment(1);
        });
        self.reporter.finish();

        match OutputFormat::from(args.format) {
            OutputFormat::Text => print!(
                "{}",
                render_exploration(scenario.name, &report, self.reporter.use_color)
            ),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        if !report.is_safe() {
            self.reporter.warning(&format!(
                "{} of {} runs violated a contract",
                report.violating_paths(),
                report.path_count()
            ));
        }
        Ok(())
    }

    /// `replay`
    pub fn replay(&self, args: &ReplayArgs) -> CliResult<()> {
        let scenario = scenarios::find(&args.scenario)?;
        let script = parse_script(&args.script)?;
        let explorer = Explorer::new(self.config.harness.clone());
        let report = explorer.replay(scenario, script);
        let Some(path) = report.paths.first() else {
            return Err(CliError::invalid_argument("replay produced no path"));
        };

        match OutputFormat::from(args.format) {
            OutputFormat::Text => print!("{}", render_run(path)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(path)?),
        }
        Ok(())
    }

    /// `config`
    pub fn show_config(&self, args: &ConfigArgs) -> CliResult<()> {
        match OutputFormat::from(args.format) {
            OutputFormat::Text => print!("{}", self.config.harness.to_yaml()?),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&self.config.harness)?);
            }
        }
        Ok(())
    }
}
