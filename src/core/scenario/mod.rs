//! Scenario Model
//!
//! The validated three-tier PSDL entity model (signals, trends, logic rules)
//! as produced by a [`ScenarioValidator`](crate::core::validator::ScenarioValidator),
//! and the outline graph derived from it.
//!
//! Entity maps are insertion-ordered so every derived view keeps the
//! declaration order of the source document.

mod outline;

pub use outline::{build_outline, LogicOutline, Outline, SignalOutline, TrendOutline};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Clinical severity of a logic rule, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity keyword, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Boolean connective used in a logic rule expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOperator {
    And,
    Or,
    Not,
}

impl BooleanOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOperator::And => "AND",
            BooleanOperator::Or => "OR",
            BooleanOperator::Not => "NOT",
        }
    }

    /// Match an expression token. Only the uppercase spelling is an operator.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(BooleanOperator::And),
            "OR" => Some(BooleanOperator::Or),
            "NOT" => Some(BooleanOperator::Not),
            _ => None,
        }
    }
}

impl std::fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A named external data input. Leaf of the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    /// Abstract source reference (e.g. `creatinine`)
    pub source: Option<String>,
    pub unit: Option<String>,
    pub domain: Option<String>,
    pub concept_id: Option<i64>,
    pub description: Option<String>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            unit: None,
            domain: None,
            concept_id: None,
            description: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_concept_id(mut self, concept_id: i64) -> Self {
        self.concept_id = Some(concept_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named numeric computation over at most one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub expr: String,
    pub description: Option<String>,
    /// The signal the expression is computed over, when determinable
    pub signal: Option<String>,
}

impl Trend {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
            description: None,
            signal: None,
        }
    }

    pub fn over(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named boolean decision rule over trends and/or other logic rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicRule {
    pub name: String,
    pub expr: String,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    /// Trend and logic names referenced by the expression
    pub terms: IndexSet<String>,
    pub operators: IndexSet<BooleanOperator>,
}

impl LogicRule {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
            severity: None,
            description: None,
            terms: IndexSet::new(),
            operators: IndexSet::new(),
        }
    }

    pub fn depends_on(mut self, term: impl Into<String>) -> Self {
        self.terms.insert(term.into());
        self
    }

    pub fn with_operator(mut self, operator: BooleanOperator) -> Self {
        self.operators.insert(operator);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Patient selection criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Population {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// A validated clinical-monitoring scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub signals: IndexMap<String, Signal>,
    pub trends: IndexMap<String, Trend>,
    pub logic: IndexMap<String, LogicRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<Population>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            signals: IndexMap::new(),
            trends: IndexMap::new(),
            logic: IndexMap::new(),
            population: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.insert(signal.name.clone(), signal);
        self
    }

    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trends.insert(trend.name.clone(), trend);
        self
    }

    pub fn with_logic(mut self, rule: LogicRule) -> Self {
        self.logic.insert(rule.name.clone(), rule);
        self
    }

    pub fn with_population(mut self, population: Population) -> Self {
        self.population = Some(population);
        self
    }

    /// JSON view of the parsed scenario, as embedded in API responses and bundles.
    pub fn to_json(&self) -> serde_json::Value {
        let signals: serde_json::Map<String, serde_json::Value> = self
            .signals
            .iter()
            .map(|(name, s)| {
                (
                    name.clone(),
                    serde_json::json!({
                        "source": s.source,
                        "concept_id": s.concept_id,
                        "unit": s.unit,
                        "domain": s.domain,
                    }),
                )
            })
            .collect();

        let trends: serde_json::Map<String, serde_json::Value> = self
            .trends
            .iter()
            .map(|(name, t)| {
                (
                    name.clone(),
                    serde_json::json!({ "expr": t.expr, "description": t.description }),
                )
            })
            .collect();

        let logic: serde_json::Map<String, serde_json::Value> = self
            .logic
            .iter()
            .map(|(name, l)| {
                (
                    name.clone(),
                    serde_json::json!({
                        "expr": l.expr,
                        "severity": l.severity,
                        "description": l.description,
                    }),
                )
            })
            .collect();

        let mut value = serde_json::json!({
            "scenario": self.name,
            "version": self.version,
            "signals": signals,
            "trends": trends,
            "logic": logic,
        });

        if let Some(description) = &self.description {
            value["description"] = serde_json::json!(description);
        }
        if let Some(population) = &self.population {
            value["population"] = serde_json::json!({
                "include": population.include,
                "exclude": population.exclude,
            });
        }

        value
    }
}
