//! Scenario Validation
//!
//! The validator is an opaque capability: scenario text in, a structured
//! scenario or a list of located issues out. The orchestrator and the HTTP
//! layer only depend on [`ScenarioValidator`].

mod expr;
mod yaml;

pub use yaml::YamlValidator;

use serde::{Deserialize, Serialize};

use crate::core::scenario::Scenario;

/// Whether an issue blocks the scenario or is only advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A validation error or warning with optional location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Line number (1-indexed)
    pub line: Option<u32>,
    /// Column number (1-indexed)
    pub column: Option<u32>,
    pub message: String,
    pub severity: IssueSeverity,
    /// JSON pointer to the offending element
    pub path: Option<String>,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            line: None,
            column: None,
            message: message.into(),
            severity: IssueSeverity::Error,
            path: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(message)
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}: {}", line, column, self.message),
            (Some(line), None) => write!(f, "{}: {}", line, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of validating one scenario text.
///
/// `scenario` is present exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub scenario: Option<Scenario>,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn valid(scenario: Scenario, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            scenario: Some(scenario),
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn invalid(errors: Vec<ValidationIssue>) -> Self {
        Self {
            scenario: None,
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }
}

/// Validates scenario text.
///
/// Implementations are synchronous and local; they are shared across
/// concurrent requests.
pub trait ScenarioValidator: Send + Sync {
    /// Identifier reported in certified bundles
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn validate(&self, content: &str) -> ValidationReport;
}

/// Advisory hints for a valid scenario: signals no trend reads and trends no
/// logic rule references.
pub fn usage_hints(scenario: &Scenario) -> Vec<ValidationIssue> {
    let mut hints = Vec::new();

    for name in scenario.signals.keys() {
        let used = scenario
            .trends
            .values()
            .any(|t| t.signal.as_deref() == Some(name.as_str()));
        if !used {
            hints.push(
                ValidationIssue::warning(format!(
                    "Signal '{}' is defined but not used in any trend",
                    name
                ))
                .with_path(format!("/signals/{}", name)),
            );
        }
    }

    for name in scenario.trends.keys() {
        let used = scenario.logic.values().any(|l| l.terms.contains(name));
        if !used {
            hints.push(
                ValidationIssue::warning(format!(
                    "Trend '{}' is defined but not used in any logic rule",
                    name
                ))
                .with_path(format!("/trends/{}", name)),
            );
        }
    }

    hints
}
