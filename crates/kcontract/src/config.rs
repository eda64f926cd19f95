//! Harness configuration.
//!
//! Loaded from YAML or JSON (chosen by file extension); every field has a
//! default so a partial file is enough.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::oracle::Seed;
use crate::result::{ContractError, ContractResult};
use crate::violation::ReportMode;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Exhaustive exploration bounds
    pub exploration: ExplorationConfig,
    /// Seeded random runs
    pub fuzz: FuzzConfig,
    /// Reaction to a violation
    pub mode: ReportMode,
}

/// Exhaustive exploration bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Maximum number of paths to run
    pub max_paths: usize,
    /// Choices per path the explorer branches on; later ones take index 0
    pub max_choices: usize,
    /// Fail instead of reporting a truncated exploration
    pub strict_budget: bool,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            max_paths: 4096,
            max_choices: 64,
            strict_budget: false,
        }
    }
}

/// Seeded random runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzConfig {
    /// Base seed
    pub seed: u64,
    /// Number of runs
    pub runs: usize,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            runs: 256,
        }
    }
}

impl HarnessConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path budget
    #[must_use]
    pub const fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.exploration.max_paths = max_paths;
        self
    }

    /// Set the branching depth
    #[must_use]
    pub const fn with_max_choices(mut self, max_choices: usize) -> Self {
        self.exploration.max_choices = max_choices;
        self
    }

    /// Fail when the path budget runs out
    #[must_use]
    pub const fn with_strict_budget(mut self, strict: bool) -> Self {
        self.exploration.strict_budget = strict;
        self
    }

    /// Set the fuzz seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.fuzz.seed = seed;
        self
    }

    /// Set the number of fuzz runs
    #[must_use]
    pub const fn with_runs(mut self, runs: usize) -> Self {
        self.fuzz.runs = runs;
        self
    }

    /// Set the report mode
    #[must_use]
    pub const fn with_mode(mut self, mode: ReportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fuzz seed as a [`Seed`]
    #[must_use]
    pub const fn seed(&self) -> Seed {
        Seed::from_u64(self.fuzz.seed)
    }

    /// Parse YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the values are invalid.
    pub fn from_yaml(yaml: &str) -> ContractResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json(json: &str) -> ContractResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> ContractResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            other => Err(ContractError::config(format!(
                "unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> ContractResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> ContractResult<()> {
        if self.exploration.max_paths == 0 {
            return Err(ContractError::config("exploration.max_paths must be positive"));
        }
        if self.fuzz.runs == 0 {
            return Err(ContractError::config("fuzz.runs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::new();
        assert_eq!(config.exploration.max_paths, 4096);
        assert_eq!(config.exploration.max_choices, 64);
        assert_eq!(config.mode, ReportMode::Collect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = HarnessConfig::new()
            .with_max_paths(10)
            .with_max_choices(5)
            .with_seed(42)
            .with_runs(3)
            .with_strict_budget(true)
            .with_mode(ReportMode::FailFast);
        assert_eq!(config.exploration.max_paths, 10);
        assert_eq!(config.seed().value(), 42);
        assert_eq!(config.fuzz.runs, 3);
        assert!(config.exploration.strict_budget);
        assert_eq!(config.mode, ReportMode::FailFast);
    }

    #[test]
    fn test_partial_yaml() {
        let config = HarnessConfig::from_yaml("mode: fail-fast\nfuzz:\n  seed: 7\n").unwrap();
        assert_eq!(config.mode, ReportMode::FailFast);
        assert_eq!(config.fuzz.seed, 7);
        assert_eq!(config.fuzz.runs, 256);
    }

    #[test]
    fn test_json() {
        let config =
            HarnessConfig::from_json(r#"{"exploration": {"max_paths": 12}}"#).unwrap();
        assert_eq!(config.exploration.max_paths, 12);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = HarnessConfig::from_yaml("exploration:\n  max_paths: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_paths"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = HarnessConfig::from_yaml("mode: [").unwrap_err();
        assert!(matches!(err, ContractError::Yaml(_)));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = HarnessConfig::new().with_seed(99);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(HarnessConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "fuzz:\n  runs: 9").unwrap();
        assert_eq!(HarnessConfig::load(&path).unwrap().fuzz.runs, 9);

        let other = dir.path().join("harness.toml");
        std::fs::write(&other, "").unwrap();
        assert!(HarnessConfig::load(&other).is_err());
    }
}
