//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use kcontract::scenarios::{Expected, Scenario};
use kcontract::{ExplorationReport, PathOutcome, RunReport};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::commands::FormatArg;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Progress and status messages on stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` runs
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }
}

/// Scenario catalog, one per line
#[must_use]
pub fn render_scenarios(scenarios: &[Scenario]) -> String {
    let width = scenarios.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for scenario in scenarios {
        let _ = writeln!(
            out,
            "{:<width$}  {:<8}  {}",
            scenario.name,
            expected_label(scenario.expected),
            scenario.description,
        );
    }
    out
}

fn expected_label(expected: Expected) -> &'static str {
    match expected {
        Expected::Safe => "safe",
        Expected::Unsafe(_) => "unsafe",
    }
}

/// Summary of an exploration or fuzz report
#[must_use]
pub fn render_exploration(name: &str, report: &ExplorationReport, use_color: bool) -> String {
    let mut out = String::new();
    let verdict = if report.is_safe() { "SAFE" } else { "UNSAFE" };
    let verdict = if use_color {
        let styled = if report.is_safe() {
            Style::new().green().bold()
        } else {
            Style::new().red().bold()
        };
        styled.apply_to(verdict).to_string()
    } else {
        verdict.to_string()
    };

    let _ = writeln!(out, "{name}: {verdict}");
    let _ = writeln!(
        out,
        "  paths: {} (completed {}, infeasible {}, exited {}, aborted {}){}",
        report.path_count(),
        report.count(PathOutcome::Completed),
        report.count(PathOutcome::Infeasible),
        report.count(PathOutcome::Exited),
        report.count(PathOutcome::Aborted),
        if report.truncated { ", truncated" } else { "" },
    );
    for id in report.violation_ids() {
        let _ = writeln!(out, "  violation: {id}");
        if let Some(witness) = report.counterexample(id) {
            let _ = writeln!(out, "    script: {}", witness.script_string());
        }
    }
    let reached = report.reached();
    if !reached.is_empty() {
        let names: Vec<_> = reached.into_iter().collect();
        let _ = writeln!(out, "  reached: {}", names.join(", "));
    }
    out
}

/// Detail of a single path
#[must_use]
pub fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "outcome: {:?}", report.outcome);
    if let Some(cut) = report.cut {
        let _ = writeln!(out, "cut: {cut}");
    }
    let _ = writeln!(out, "choices: {}", report.script_string());
    let _ = writeln!(out, "fingerprint: {}", report.fingerprint);
    if report.violations.is_empty() {
        let _ = writeln!(out, "violations: none");
    }
    for violation in &report.violations {
        let _ = writeln!(out, "violation: {violation}");
    }
    out
}
