//! Semantic Outline
//!
//! Presentation graph of a scenario: every node carries its forward
//! dependencies (`depends_on`) and the derived reverse edges (`used_by`).
//!
//! Reverse edges exist only for signal <- trend and trend <- logic. A logic
//! rule that references another logic rule keeps the reference on its own
//! `depends_on`, but the referenced rule's `used_by` stays empty. References
//! to names that are not declared produce no reverse edge.

use serde::{Deserialize, Serialize};

use super::{BooleanOperator, LogicRule, Scenario, Severity, Signal, Trend};

/// Signal node in the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalOutline {
    pub name: String,
    pub source: Option<String>,
    pub concept_id: Option<i64>,
    pub unit: Option<String>,
    pub domain: Option<String>,
    pub description: Option<String>,
    /// Trends computed over this signal
    #[serde(default)]
    pub used_by: Vec<String>,
}

/// Trend node in the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendOutline {
    pub name: String,
    pub expr: String,
    pub description: Option<String>,
    /// Zero or one signal name
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Logic rules referencing this trend
    #[serde(default)]
    pub used_by: Vec<String>,
}

/// Logic rule node in the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicOutline {
    pub name: String,
    pub expr: String,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    /// Trends and logic rules this rule depends on
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub operators: Vec<BooleanOperator>,
    #[serde(default)]
    pub used_by: Vec<String>,
}

/// Semantic outline of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub scenario: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub signals: Vec<SignalOutline>,
    pub trends: Vec<TrendOutline>,
    pub logic: Vec<LogicOutline>,
}

impl Outline {
    pub fn signal(&self, name: &str) -> Option<&SignalOutline> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn trend(&self, name: &str) -> Option<&TrendOutline> {
        self.trends.iter().find(|t| t.name == name)
    }

    pub fn logic_rule(&self, name: &str) -> Option<&LogicOutline> {
        self.logic.iter().find(|l| l.name == name)
    }
}

impl From<&Signal> for SignalOutline {
    fn from(signal: &Signal) -> Self {
        Self {
            name: signal.name.clone(),
            source: signal.source.clone(),
            concept_id: signal.concept_id,
            unit: signal.unit.clone(),
            domain: signal.domain.clone(),
            description: signal.description.clone(),
            used_by: Vec::new(),
        }
    }
}

impl From<&Trend> for TrendOutline {
    fn from(trend: &Trend) -> Self {
        Self {
            name: trend.name.clone(),
            expr: trend.expr.clone(),
            description: trend.description.clone(),
            depends_on: trend.signal.iter().cloned().collect(),
            used_by: Vec::new(),
        }
    }
}

impl From<&LogicRule> for LogicOutline {
    fn from(rule: &LogicRule) -> Self {
        Self {
            name: rule.name.clone(),
            expr: rule.expr.clone(),
            severity: rule.severity,
            description: rule.description.clone(),
            depends_on: rule.terms.iter().cloned().collect(),
            operators: rule.operators.iter().copied().collect(),
            used_by: Vec::new(),
        }
    }
}

/// Build the outline of a validated scenario.
///
/// Node lists follow the scenario's declaration order, and each `used_by`
/// list follows the declaration order of the dependents. Name lookups go
/// through the scenario's ordered maps, whose positions match the node lists.
pub fn build_outline(scenario: &Scenario) -> Outline {
    let mut signals: Vec<SignalOutline> = scenario.signals.values().map(Into::into).collect();
    let mut trends: Vec<TrendOutline> = scenario.trends.values().map(Into::into).collect();
    let logic: Vec<LogicOutline> = scenario.logic.values().map(Into::into).collect();

    // Signals <- trends
    for trend in scenario.trends.values() {
        let Some(signal) = trend.signal.as_deref() else {
            continue;
        };
        if let Some(idx) = scenario.signals.get_index_of(signal) {
            signals[idx].used_by.push(trend.name.clone());
        }
    }

    // Trends <- logic
    for rule in scenario.logic.values() {
        for term in &rule.terms {
            if let Some(idx) = scenario.trends.get_index_of(term.as_str()) {
                trends[idx].used_by.push(rule.name.clone());
            }
        }
    }

    Outline {
        scenario: scenario.name.clone(),
        version: scenario.version.clone(),
        description: scenario.description.clone(),
        signals,
        trends,
        logic,
    }
}
