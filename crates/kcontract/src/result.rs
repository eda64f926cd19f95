//! Result and error types for kcontract.
//!
//! Modelled contract violations are not errors: they are values collected in
//! [`crate::ViolationLog`]. The types here cover the harness's own failures
//! (bad configuration, unknown scenario, I/O).

use thiserror::Error;

/// Result type for kcontract operations
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors that can occur in kcontract
#[derive(Debug, Error)]
pub enum ContractError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Scenario lookup failed
    #[error("Unknown scenario: {name}")]
    UnknownScenario {
        /// Requested scenario name
        name: String,
    },

    /// A choice script could not be parsed
    #[error("Invalid choice script: {message}")]
    InvalidScript {
        /// Error message
        message: String,
    },

    /// Exploration aborted before covering the path space
    #[error("Exploration budget exhausted after {paths} paths")]
    BudgetExhausted {
        /// Paths explored before the budget ran out
        paths: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ContractError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unknown-scenario error
    #[must_use]
    pub fn unknown_scenario(name: impl Into<String>) -> Self {
        Self::UnknownScenario { name: name.into() }
    }

    /// Create an invalid-script error
    #[must_use]
    pub fn invalid_script(message: impl Into<String>) -> Self {
        Self::InvalidScript {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = ContractError::config("max_paths must be positive");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("max_paths"));
    }

    #[test]
    fn test_unknown_scenario_error() {
        let err = ContractError::unknown_scenario("gendisk_missing");
        assert_eq!(err.to_string(), "Unknown scenario: gendisk_missing");
    }

    #[test]
    fn test_budget_error() {
        let err = ContractError::BudgetExhausted { paths: 64 };
        assert!(err.to_string().contains("64 paths"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml");
        let err: ContractError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
