//! Structural validator for PSDL YAML documents.
//!
//! Checks document shape, operator names, window literals and name
//! resolution between the three tiers, and derives the forward dependencies
//! the outline is built from. Expression semantics are not evaluated.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use super::expr::{is_valid_window, ExprSummary, KNOWN_OPERATORS};
use super::{usage_hints, ScenarioValidator, ValidationIssue, ValidationReport};
use crate::core::scenario::{
    BooleanOperator, LogicRule, Population, Scenario, Severity, Signal, Trend,
};

// ============================================================================
// Document Shape
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawDocument {
    scenario: Option<String>,
    version: Option<serde_yaml_ng::Value>,
    description: Option<String>,
    population: Option<Population>,
    signals: Option<IndexMap<String, Option<RawSignal>>>,
    trends: Option<IndexMap<String, Option<RawTrend>>>,
    logic: Option<IndexMap<String, Option<RawLogic>>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSignal {
    #[serde(rename = "ref", alias = "source")]
    reference: Option<String>,
    #[serde(rename = "expected_unit", alias = "unit")]
    unit: Option<String>,
    concept_id: Option<i64>,
    domain: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrend {
    expr: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLogic {
    #[serde(alias = "expr")]
    when: Option<String>,
    severity: Option<String>,
    description: Option<String>,
}

// ============================================================================
// Validator
// ============================================================================

/// Validates PSDL scenarios written in YAML.
#[derive(Debug, Clone, Default)]
pub struct YamlValidator;

impl YamlValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ScenarioValidator for YamlValidator {
    fn name(&self) -> &str {
        "psdl-inspector-yaml"
    }

    fn version(&self) -> &str {
        crate::VERSION
    }

    fn validate(&self, content: &str) -> ValidationReport {
        if content.trim().is_empty() {
            return ValidationReport::invalid(vec![ValidationIssue::error(
                "Scenario content is empty",
            )]);
        }

        let document: RawDocument = match serde_yaml_ng::from_str(content) {
            Ok(document) => document,
            Err(e) => return ValidationReport::invalid(vec![yaml_issue(&e)]),
        };

        let mut checker = Checker::default();
        let scenario = checker.build(document);

        if checker.errors.is_empty() {
            let warnings = usage_hints(&scenario);
            ValidationReport::valid(scenario, warnings)
        } else {
            ValidationReport::invalid(checker.errors)
        }
    }
}

fn yaml_issue(error: &serde_yaml_ng::Error) -> ValidationIssue {
    let issue = ValidationIssue::error(format!("YAML parse error: {}", error));
    match error.location() {
        Some(location) => issue.at(location.line() as u32, location.column() as u32),
        None => issue,
    }
}

fn scalar_text(value: &serde_yaml_ng::Value) -> Option<String> {
    match value {
        serde_yaml_ng::Value::String(s) => Some(s.clone()),
        serde_yaml_ng::Value::Number(n) => Some(n.to_string()),
        serde_yaml_ng::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Checker
// ============================================================================

#[derive(Default)]
struct Checker {
    errors: Vec<ValidationIssue>,
}

impl Checker {
    fn error(&mut self, message: String, path: String) {
        self.errors
            .push(ValidationIssue::error(message).with_path(path));
    }

    fn build(&mut self, document: RawDocument) -> Scenario {
        let name = match non_empty(document.scenario) {
            Some(name) => name,
            None => {
                self.error(
                    "Missing required field 'scenario'".to_string(),
                    "/scenario".to_string(),
                );
                String::new()
            }
        };

        let mut scenario = Scenario::new(name);
        scenario.version = document.version.as_ref().and_then(scalar_text);
        scenario.description = document.description;
        scenario.population = document.population;

        for (name, raw) in document.signals.unwrap_or_default() {
            let raw = raw.unwrap_or_default();
            let signal = Signal {
                name: name.clone(),
                source: raw.reference,
                unit: raw.unit,
                domain: raw.domain,
                concept_id: raw.concept_id,
                description: raw.description,
            };
            scenario.signals.insert(name, signal);
        }

        for (name, raw) in document.trends.unwrap_or_default() {
            let trend = self.check_trend(&name, raw.unwrap_or_default(), &scenario.signals);
            scenario.trends.insert(name, trend);
        }

        let raw_logic = document.logic.unwrap_or_default();
        let logic_names: IndexSet<String> = raw_logic.keys().cloned().collect();
        for (name, raw) in raw_logic {
            let rule = self.check_logic(
                &name,
                raw.unwrap_or_default(),
                &scenario.signals,
                &scenario.trends,
                &logic_names,
            );
            scenario.logic.insert(name, rule);
        }

        self.check_cycles(&scenario.logic);

        scenario
    }

    /// Operator names and window literals shared by trends and logic.
    fn check_calls(&mut self, summary: &ExprSummary<'_>, owner: &str, path: &str) {
        let unknown: IndexSet<&str> = summary
            .calls
            .iter()
            .map(|c| c.function)
            .filter(|f| !KNOWN_OPERATORS.contains(f))
            .collect();
        for function in unknown {
            let hint = if function == "avg" { " (use sma() for averages)" } else { "" };
            self.error(
                format!("Unknown operator '{}' in {}{}", function, owner, hint),
                path.to_string(),
            );
        }

        for window in summary.durations.iter().filter(|d| !is_valid_window(d)) {
            self.error(
                format!(
                    "Invalid window '{}' in {} (expected INTEGER + s|m|h|d|w, e.g. 48h)",
                    window, owner
                ),
                path.to_string(),
            );
        }
    }

    fn check_trend(
        &mut self,
        name: &str,
        raw: RawTrend,
        signals: &IndexMap<String, Signal>,
    ) -> Trend {
        let path = format!("/trends/{}/expr", name);
        let owner = format!("trend '{}'", name);

        let Some(expr) = non_empty(raw.expr) else {
            self.error(format!("Trend '{}' is missing 'expr'", name), path);
            return Trend {
                name: name.to_string(),
                expr: String::new(),
                description: raw.description,
                signal: None,
            };
        };

        let summary = ExprSummary::scan(&expr);
        self.check_calls(&summary, &owner, &path);

        if let Some(op) = summary.comparisons.first() {
            self.error(
                format!(
                    "Comparison operator '{}' is not allowed in {}; comparisons belong in logic rules",
                    op, owner
                ),
                path.clone(),
            );
        }

        let referenced: IndexSet<&str> = summary
            .call_args
            .iter()
            .chain(summary.references.iter())
            .copied()
            .collect();
        for reference in referenced {
            if !signals.contains_key(reference) {
                self.error(
                    format!("Unknown signal '{}' referenced in {}", reference, owner),
                    path.clone(),
                );
            }
        }

        let signal = summary
            .outer_call()
            .and_then(|c| c.first_arg)
            .or_else(|| {
                summary
                    .references
                    .iter()
                    .copied()
                    .find(|r| signals.contains_key(*r))
            })
            .or_else(|| summary.call_args.first().copied())
            .map(str::to_string);

        Trend {
            name: name.to_string(),
            expr: expr.clone(),
            description: raw.description,
            signal,
        }
    }

    fn check_logic(
        &mut self,
        name: &str,
        raw: RawLogic,
        signals: &IndexMap<String, Signal>,
        trends: &IndexMap<String, Trend>,
        logic_names: &IndexSet<String>,
    ) -> LogicRule {
        let path = format!("/logic/{}/when", name);
        let owner = format!("logic rule '{}'", name);

        let severity = match raw.severity.as_deref() {
            None => None,
            Some(value) => {
                let parsed = Severity::parse(value);
                if parsed.is_none() {
                    self.error(
                        format!(
                            "Invalid severity '{}' in {} (expected low, medium, high or critical)",
                            value, owner
                        ),
                        format!("/logic/{}/severity", name),
                    );
                }
                parsed
            }
        };

        let mut rule = LogicRule {
            name: name.to_string(),
            expr: String::new(),
            severity,
            description: raw.description,
            terms: IndexSet::new(),
            operators: IndexSet::new(),
        };

        let Some(expr) = non_empty(raw.when) else {
            self.error(format!("Logic rule '{}' is missing 'when'", name), path);
            return rule;
        };

        let summary = ExprSummary::scan(&expr);
        self.check_calls(&summary, &owner, &path);

        // inline calls read signals directly
        let call_args: IndexSet<&str> = summary.call_args.iter().copied().collect();
        for arg in call_args {
            if !signals.contains_key(arg) {
                self.error(
                    format!("Unknown signal '{}' referenced in {}", arg, owner),
                    path.clone(),
                );
            }
        }

        for reference in summary.references.iter().copied() {
            if let Some(op) = BooleanOperator::from_token(reference) {
                rule.operators.insert(op);
            } else if matches!(reference, "and" | "or" | "not" | "And" | "Or" | "Not") {
                self.error(
                    format!(
                        "Boolean operator '{}' in {} must be uppercase ({})",
                        reference,
                        owner,
                        reference.to_ascii_uppercase()
                    ),
                    path.clone(),
                );
            } else if matches!(reference, "true" | "false") {
                continue;
            } else if reference == name {
                self.error(format!("Logic rule '{}' references itself", name), path.clone());
            } else if trends.contains_key(reference) || logic_names.contains(reference) {
                rule.terms.insert(reference.to_string());
            } else {
                self.error(
                    format!("Unknown term '{}' in {}", reference, owner),
                    path.clone(),
                );
            }
        }

        rule.expr = expr.clone();
        rule
    }

    fn check_cycles(&mut self, logic: &IndexMap<String, LogicRule>) {
        let mut marks: HashMap<&str, Mark> = HashMap::new();

        for name in logic.keys() {
            if let Some(cycle) = find_cycle(name, logic, &mut marks) {
                self.error(
                    format!("Circular dependency in logic rules: {}", cycle.join(" -> ")),
                    format!("/logic/{}", cycle[0]),
                );
                return;
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first search from `root` over logic-to-logic references.
///
/// Iterative. Each stack frame is an open rule and the index of its next term.
fn find_cycle<'a>(
    root: &'a str,
    logic: &'a IndexMap<String, LogicRule>,
    marks: &mut HashMap<&'a str, Mark>,
) -> Option<Vec<&'a str>> {
    if marks.contains_key(root) {
        return None;
    }

    marks.insert(root, Mark::Visiting);
    let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let term = logic
            .get(node)
            .and_then(|rule| rule.terms.get_index(next))
            .map(String::as_str);

        let Some(term) = term else {
            marks.insert(node, Mark::Done);
            stack.pop();
            continue;
        };
        frame.1 += 1;

        if !logic.contains_key(term) {
            continue;
        }

        match marks.get(term) {
            Some(Mark::Done) => {}
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|(n, _)| *n == term)?;
                let mut cycle: Vec<&'a str> = stack[start..].iter().map(|(n, _)| *n).collect();
                cycle.push(term);
                return Some(cycle);
            }
            None => {
                marks.insert(term, Mark::Visiting);
                stack.push((term, 0));
            }
        }
    }

    None
}
