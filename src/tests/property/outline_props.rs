//! Property-based tests for the Outline builder
//!
//! Tests invariants:
//! - A name appears in a node's `used_by` iff that dependent declares a
//!   forward reference to the node
//! - References to undeclared names never create reverse edges
//! - Logic rules never receive reverse edges
//! - Node order follows declaration order
//! - Building twice yields the same outline

use proptest::prelude::*;

use crate::core::scenario::{build_outline, LogicRule, Scenario, Signal, Trend};

// ============================================================================
// Strategies
// ============================================================================

/// Raw shape of a generated scenario: trend i points at signal index
/// `trend_refs[i]` (possibly out of range), and logic rule j references
/// trend/logic indices (possibly out of range).
#[derive(Debug, Clone)]
struct ScenarioShape {
    signals: usize,
    trend_refs: Vec<Option<usize>>,
    logic_trend_refs: Vec<Vec<usize>>,
    logic_logic_refs: Vec<Vec<usize>>,
}

fn arb_shape() -> impl Strategy<Value = ScenarioShape> {
    (0usize..5, 0usize..6, 0usize..5).prop_flat_map(|(signals, trends, rules)| {
        (
            Just(signals),
            prop::collection::vec(prop::option::of(0usize..7), trends),
            prop::collection::vec(prop::collection::vec(0usize..8, 0..4), rules),
            prop::collection::vec(prop::collection::vec(0usize..6, 0..2), rules),
        )
            .prop_map(
                |(signals, trend_refs, logic_trend_refs, logic_logic_refs)| ScenarioShape {
                    signals,
                    trend_refs,
                    logic_trend_refs,
                    logic_logic_refs,
                },
            )
    })
}

fn signal_name(i: usize) -> String {
    format!("Sig{}", i)
}

fn trend_name(i: usize) -> String {
    format!("trend_{}", i)
}

fn logic_name(i: usize) -> String {
    format!("rule_{}", i)
}

fn build_scenario(shape: &ScenarioShape) -> Scenario {
    let mut scenario = Scenario::new("Generated");

    for i in 0..shape.signals {
        scenario = scenario.with_signal(Signal::new(signal_name(i)));
    }

    for (i, signal_ref) in shape.trend_refs.iter().enumerate() {
        let mut trend = Trend::new(trend_name(i), "last(x)");
        if let Some(s) = signal_ref {
            trend = trend.over(signal_name(*s));
        }
        scenario = scenario.with_trend(trend);
    }

    for (j, trend_refs) in shape.logic_trend_refs.iter().enumerate() {
        let mut rule = LogicRule::new(logic_name(j), "x");
        for t in trend_refs {
            rule = rule.depends_on(trend_name(*t));
        }
        for l in &shape.logic_logic_refs[j] {
            if *l != j {
                rule = rule.depends_on(logic_name(*l));
            }
        }
        scenario = scenario.with_logic(rule);
    }

    scenario
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn signal_reverse_edges_match_forward_refs(shape in arb_shape()) {
        let scenario = build_scenario(&shape);
        let outline = build_outline(&scenario);

        for signal in &outline.signals {
            let expected: Vec<String> = scenario
                .trends
                .values()
                .filter(|t| t.signal.as_deref() == Some(signal.name.as_str()))
                .map(|t| t.name.clone())
                .collect();
            prop_assert_eq!(&signal.used_by, &expected);
        }
    }

    #[test]
    fn trend_reverse_edges_match_forward_refs(shape in arb_shape()) {
        let scenario = build_scenario(&shape);
        let outline = build_outline(&scenario);

        for trend in &outline.trends {
            let expected: Vec<String> = scenario
                .logic
                .values()
                .filter(|r| r.terms.contains(&trend.name))
                .map(|r| r.name.clone())
                .collect();
            prop_assert_eq!(&trend.used_by, &expected);
        }
    }

    #[test]
    fn reverse_edges_only_name_declared_dependents(shape in arb_shape()) {
        let scenario = build_scenario(&shape);
        let outline = build_outline(&scenario);

        for signal in &outline.signals {
            for user in &signal.used_by {
                prop_assert!(scenario.trends.contains_key(user));
            }
        }
        for trend in &outline.trends {
            for user in &trend.used_by {
                prop_assert!(scenario.logic.contains_key(user));
            }
        }
        for rule in &outline.logic {
            prop_assert!(rule.used_by.is_empty());
        }
    }

    #[test]
    fn forward_refs_are_kept_verbatim(shape in arb_shape()) {
        let scenario = build_scenario(&shape);
        let outline = build_outline(&scenario);

        for (trend, node) in scenario.trends.values().zip(&outline.trends) {
            let expected: Vec<String> = trend.signal.iter().cloned().collect();
            prop_assert_eq!(&node.depends_on, &expected);
        }
        for (rule, node) in scenario.logic.values().zip(&outline.logic) {
            let expected: Vec<String> = rule.terms.iter().cloned().collect();
            prop_assert_eq!(&node.depends_on, &expected);
        }
    }

    #[test]
    fn node_order_follows_declaration(shape in arb_shape()) {
        let scenario = build_scenario(&shape);
        let outline = build_outline(&scenario);

        let signals: Vec<&String> = outline.signals.iter().map(|s| &s.name).collect();
        let trends: Vec<&String> = outline.trends.iter().map(|t| &t.name).collect();
        let logic: Vec<&String> = outline.logic.iter().map(|l| &l.name).collect();

        prop_assert_eq!(signals, scenario.signals.keys().collect::<Vec<_>>());
        prop_assert_eq!(trends, scenario.trends.keys().collect::<Vec<_>>());
        prop_assert_eq!(logic, scenario.logic.keys().collect::<Vec<_>>());
    }

    #[test]
    fn building_is_idempotent(shape in arb_shape()) {
        let scenario = build_scenario(&shape);
        prop_assert_eq!(build_outline(&scenario), build_outline(&scenario));
    }
}
