//! Certified Bundle Export
//!
//! Packages a validated scenario with its raw text, a SHA-256 checksum,
//! validation outcome, audit metadata and a human-readable summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::scenario::Scenario;
use crate::core::validator::{ScenarioValidator, ValidationIssue, ValidationReport};

pub const BUNDLE_VERSION: &str = "1.0";

/// Summary rendering requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain-text summary
    #[default]
    Json,
    Markdown,
}

/// Scenario identity and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContent {
    pub name: String,
    pub version: Option<String>,
    pub raw_yaml: String,
    pub parsed: serde_json::Value,
}

/// Validation outcome and the tool versions that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub validator: String,
    pub validator_version: String,
    pub inspector_version: String,
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Governance metadata supplied with the export request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub intent: Option<String>,
    pub rationale: Option<String>,
    pub provenance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifiedBundle {
    pub bundle_version: String,
    /// RFC 3339, UTC
    pub certified_at: String,
    /// `sha256:<hex>` over the raw text
    pub checksum: String,
    pub scenario: ScenarioContent,
    pub validation: ValidationResult,
    pub audit: AuditInfo,
    pub summary: String,
}

/// `sha256:<hex>` digest of the raw scenario text.
pub fn checksum(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    format!("sha256:{}", hex::encode(digest))
}

/// Build a bundle stamped with the current time.
pub fn certify(
    scenario: &Scenario,
    raw: &str,
    report: &ValidationReport,
    validator: &dyn ScenarioValidator,
    audit: AuditInfo,
    format: ExportFormat,
) -> CertifiedBundle {
    certify_at(scenario, raw, report, validator, audit, format, Utc::now())
}

pub fn certify_at(
    scenario: &Scenario,
    raw: &str,
    report: &ValidationReport,
    validator: &dyn ScenarioValidator,
    audit: AuditInfo,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> CertifiedBundle {
    CertifiedBundle {
        bundle_version: BUNDLE_VERSION.to_string(),
        certified_at: now.to_rfc3339(),
        checksum: checksum(raw),
        scenario: ScenarioContent {
            name: scenario.name.clone(),
            version: scenario.version.clone(),
            raw_yaml: raw.to_string(),
            parsed: scenario.to_json(),
        },
        validation: ValidationResult {
            validator: validator.name().to_string(),
            validator_version: validator.version().to_string(),
            inspector_version: crate::VERSION.to_string(),
            valid: report.is_valid(),
            errors: report.errors.clone(),
            warnings: report.warnings.clone(),
        },
        audit,
        summary: summary(scenario, format),
    }
}

/// Human-readable overview for reviewers.
pub fn summary(scenario: &Scenario, format: ExportFormat) -> String {
    match format {
        ExportFormat::Markdown => markdown_summary(scenario),
        ExportFormat::Json => text_summary(scenario),
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn text_summary(scenario: &Scenario) -> String {
    let mut lines = vec![format!("SCENARIO: {}", scenario.name)];
    if let Some(version) = &scenario.version {
        lines.push(format!("Version: {}", version));
    }
    if let Some(description) = &scenario.description {
        lines.push(format!("Description: {}", description));
    }
    lines.push("=".repeat(60));

    if !scenario.signals.is_empty() {
        lines.push(String::new());
        lines.push("SIGNALS:".to_string());
        for (name, signal) in &scenario.signals {
            let unit = signal
                .unit
                .as_ref()
                .map(|u| format!(" ({})", u))
                .unwrap_or_default();
            lines.push(format!("  - {}: ref={}{}", name, dash(signal.source.as_deref()), unit));
        }
    }

    if !scenario.trends.is_empty() {
        lines.push(String::new());
        lines.push("TRENDS:".to_string());
        for (name, trend) in &scenario.trends {
            let description = trend
                .description
                .as_ref()
                .map(|d| format!(" -- {}", d))
                .unwrap_or_default();
            lines.push(format!("  - {}: {}{}", name, trend.expr, description));
        }
    }

    if !scenario.logic.is_empty() {
        lines.push(String::new());
        lines.push("LOGIC RULES:".to_string());
        for (name, rule) in &scenario.logic {
            let severity = rule
                .severity
                .map(|s| format!(" [{}]", s.as_str().to_uppercase()))
                .unwrap_or_default();
            let description = rule
                .description
                .as_ref()
                .map(|d| format!(" -- {}", d))
                .unwrap_or_default();
            lines.push(format!("  - {}{}: {}{}", name, severity, rule.expr, description));
        }
    }

    if let Some(population) = scenario.population.as_ref().filter(|p| !p.is_empty()) {
        lines.push(String::new());
        lines.push("POPULATION FILTERS:".to_string());
        if !population.include.is_empty() {
            lines.push("  Include:".to_string());
            lines.extend(population.include.iter().map(|c| format!("    - {}", c)));
        }
        if !population.exclude.is_empty() {
            lines.push("  Exclude:".to_string());
            lines.extend(population.exclude.iter().map(|c| format!("    - {}", c)));
        }
    }

    lines.join("\n")
}

fn markdown_summary(scenario: &Scenario) -> String {
    let mut lines = vec![format!("# {}", scenario.name)];
    if let Some(version) = &scenario.version {
        lines.push(format!("**Version:** {}", version));
    }
    lines.push(String::new());
    if let Some(description) = &scenario.description {
        lines.push(format!("**Description:** {}", description));
        lines.push(String::new());
    }

    if !scenario.signals.is_empty() {
        lines.push(String::new());
        lines.push("## Signals".to_string());
        lines.push(String::new());
        lines.push("| Name | Source | Unit | Domain |".to_string());
        lines.push("|------|--------|------|--------|".to_string());
        for (name, signal) in &scenario.signals {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                name,
                dash(signal.source.as_deref()),
                dash(signal.unit.as_deref()),
                dash(signal.domain.as_deref()),
            ));
        }
    }

    if !scenario.trends.is_empty() {
        lines.push(String::new());
        lines.push("## Trends".to_string());
        lines.push(String::new());
        for (name, trend) in &scenario.trends {
            lines.push(format!("**{}**", name));
            lines.push(format!("- Expression: `{}`", trend.expr));
            if let Some(description) = &trend.description {
                lines.push(format!("- Description: {}", description));
            }
            lines.push(String::new());
        }
    }

    if !scenario.logic.is_empty() {
        lines.push(String::new());
        lines.push("## Logic Rules".to_string());
        lines.push(String::new());
        for (name, rule) in &scenario.logic {
            let severity = rule
                .severity
                .map(|s| s.as_str().to_uppercase())
                .unwrap_or_else(|| "INFO".to_string());
            lines.push(format!("**{}** [{}]", name, severity));
            lines.push(format!("- Condition: `{}`", rule.expr));
            if let Some(description) = &rule.description {
                lines.push(format!("- Description: {}", description));
            }
            lines.push(String::new());
        }
    }

    if let Some(population) = scenario.population.as_ref().filter(|p| !p.is_empty()) {
        lines.push(String::new());
        lines.push("## Population Filters".to_string());
        lines.push(String::new());
        if !population.include.is_empty() {
            lines.push("**Include:**".to_string());
            lines.extend(population.include.iter().map(|c| format!("- {}", c)));
        }
        if !population.exclude.is_empty() {
            lines.push(String::new());
            lines.push("**Exclude:**".to_string());
            lines.extend(population.exclude.iter().map(|c| format!("- {}", c)));
        }
    }

    lines.join("\n")
}
