//! Generation Session Integration Tests
//!
//! Runs the orchestrator end to end against scripted providers:
//! - retry accounting and termination
//! - correction feedback
//! - provider failures and readiness
//! - extraction and validation with the real YAML validator

use std::sync::Arc;

use crate::core::generation::{
    GenerationError, GenerationOrchestrator, SessionRequest, SessionState,
};
use crate::core::llm::{LLMError, ProviderRegistry};
use crate::core::scenario::build_outline;
use crate::core::validator::{ScenarioValidator, YamlValidator};
use crate::tests::mocks::{MarkerValidator, RecordedCall, ScriptedProvider};

// ============================================================================
// Helpers
// ============================================================================

fn orchestrator_with(
    provider: Arc<ScriptedProvider>,
    validator: Arc<dyn ScenarioValidator>,
) -> GenerationOrchestrator {
    let registry = ProviderRegistry::new().with_provider(provider);
    GenerationOrchestrator::new(Arc::new(registry), validator)
}

fn marker_orchestrator(provider: Arc<ScriptedProvider>) -> GenerationOrchestrator {
    orchestrator_with(provider, Arc::new(MarkerValidator))
}

fn request(max_retries: u32) -> SessionRequest {
    SessionRequest::new("Detect AKI", "scripted").with_max_retries(max_retries)
}

// ============================================================================
// Retry Accounting
// ============================================================================

#[tokio::test]
async fn test_valid_first_draft_needs_one_call() {
    let provider = Arc::new(ScriptedProvider::new("scripted").with_responses(["good draft"]));
    let orchestrator = marker_orchestrator(provider.clone());

    let result = orchestrator.run_session(request(3)).await.unwrap();

    assert!(result.valid);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.text, "good draft");
    assert!(result.errors.is_empty());
    assert_eq!(result.warnings, vec!["accepted with hint".to_string()]);
    assert_eq!(provider.generate_calls(), 1);
    assert_eq!(provider.correct_calls(), 0);
}

#[tokio::test]
async fn test_succeeds_after_corrections() {
    let provider = Arc::new(ScriptedProvider::new("scripted").with_responses([
        "draft-1 INVALID",
        "draft-2 INVALID",
        "draft-3",
    ]));
    let orchestrator = marker_orchestrator(provider.clone());

    let session = orchestrator.run(request(3)).await.unwrap();

    assert_eq!(session.state, SessionState::Succeeded);
    assert_eq!(session.attempt_count(), 3);
    assert_eq!(provider.generate_calls(), 1);
    assert_eq!(provider.correct_calls(), 2);

    let indices: Vec<u32> = session.attempts.iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);

    let result = session.result().unwrap();
    assert!(result.valid);
    assert_eq!(result.text, "draft-3");
}

#[tokio::test]
async fn test_exhausts_budget() {
    let provider = Arc::new(ScriptedProvider::new("scripted").with_responses([
        "draft-1 INVALID",
        "draft-2 INVALID",
        "draft-3 INVALID",
        "never requested",
    ]));
    let orchestrator = marker_orchestrator(provider.clone());

    let session = orchestrator.run(request(2)).await.unwrap();

    assert_eq!(session.state, SessionState::Exhausted);
    assert_eq!(provider.total_calls(), 3);

    let result = session.result().unwrap();
    assert!(!result.valid);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.text, "draft-3 INVALID");
    assert_eq!(result.errors, vec!["rejected: draft-3 INVALID".to_string()]);
}

#[tokio::test]
async fn test_zero_retries_allows_single_attempt() {
    let provider = Arc::new(
        ScriptedProvider::new("scripted").with_responses(["draft-1 INVALID", "draft-2"]),
    );
    let orchestrator = marker_orchestrator(provider.clone());

    let result = orchestrator.run_session(request(0)).await.unwrap();

    assert!(!result.valid);
    assert_eq!(result.attempts, 1);
    assert_eq!(provider.generate_calls(), 1);
    assert_eq!(provider.correct_calls(), 0);
}

// ============================================================================
// Correction Feedback
// ============================================================================

#[tokio::test]
async fn test_correction_receives_previous_candidate_and_errors() {
    let provider = Arc::new(
        ScriptedProvider::new("scripted").with_responses(["```yaml\ndraft-1 INVALID\n```", "ok"]),
    );
    let orchestrator = marker_orchestrator(provider.clone());

    let req = request(1)
        .with_clinical_context("KDIGO: >= 0.3 mg/dL in 48h")
        .with_model("custom-model");
    orchestrator.run_session(req).await.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);

    assert_eq!(
        calls[0],
        RecordedCall::Generate {
            prompt: "Detect AKI".to_string(),
            clinical_context: Some("KDIGO: >= 0.3 mg/dL in 48h".to_string()),
            model: Some("custom-model".to_string()),
        }
    );

    // The fenced body is what was validated, so it is what gets corrected
    assert_eq!(
        calls[1],
        RecordedCall::Correct {
            previous: "draft-1 INVALID".to_string(),
            errors: vec!["rejected: draft-1 INVALID".to_string()],
            original_prompt: "Detect AKI".to_string(),
            model: Some("custom-model".to_string()),
        }
    );
}

// ============================================================================
// Provider Failures
// ============================================================================

#[tokio::test]
async fn test_unknown_provider() {
    let provider = Arc::new(ScriptedProvider::new("scripted").with_responses(["ok"]));
    let orchestrator = marker_orchestrator(provider.clone());

    let err = orchestrator
        .run_session(SessionRequest::new("Detect AKI", "gemini"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::UnknownProvider(ref id) if id == "gemini"));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn test_unavailable_provider_is_not_called() {
    let provider = Arc::new(
        ScriptedProvider::new("scripted")
            .with_responses(["ok"])
            .not_ready(),
    );
    let orchestrator = marker_orchestrator(provider.clone());

    let err = orchestrator.run_session(request(3)).await.unwrap_err();

    assert!(matches!(err, GenerationError::ProviderUnavailable(_)));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn test_failed_generate_ends_session() {
    let provider = Arc::new(ScriptedProvider::new("scripted").then_fail(LLMError::Timeout));
    let orchestrator = marker_orchestrator(provider.clone());

    let err = orchestrator.run_session(request(3)).await.unwrap_err();

    match err {
        GenerationError::ProviderCallFailure {
            provider: id,
            attempts,
            source,
        } => {
            assert_eq!(id, "scripted");
            assert_eq!(attempts, 0);
            assert!(matches!(source, LLMError::Timeout));
        }
        other => panic!("expected ProviderCallFailure, got {:?}", other),
    }
    assert_eq!(provider.total_calls(), 1);
}

#[tokio::test]
async fn test_failed_correction_does_not_retry() {
    let provider = Arc::new(
        ScriptedProvider::new("scripted")
            .with_responses(["draft-1 INVALID"])
            .then_fail(LLMError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
            .with_responses(["never requested"]),
    );
    let orchestrator = marker_orchestrator(provider.clone());

    let err = orchestrator.run_session(request(3)).await.unwrap_err();

    assert!(matches!(
        err,
        GenerationError::ProviderCallFailure { attempts: 1, .. }
    ));
    assert_eq!(provider.generate_calls(), 1);
    assert_eq!(provider.correct_calls(), 1);
}

#[tokio::test]
async fn test_provider_lookup_is_case_insensitive() {
    let provider = Arc::new(ScriptedProvider::new("scripted").with_responses(["ok"]));
    let orchestrator = marker_orchestrator(provider.clone());

    let result = orchestrator
        .run_session(SessionRequest::new("Detect AKI", "Scripted"))
        .await
        .unwrap();

    assert!(result.valid);
}

// ============================================================================
// End to End With The YAML Validator
// ============================================================================

const AKI_WITH_AVG: &str = r#"Here is your scenario:

```yaml
scenario: AKI_Detection
version: "1.0.0"
signals:
  Cr:
    ref: creatinine
    expected_unit: mg/dL
trends:
  cr_avg:
    expr: avg(Cr, 48h)
logic:
  aki_risk:
    when: cr_avg >= 1.5
    severity: high
```
"#;

const AKI_FIXED: &str = r#"```yaml
scenario: AKI_Detection
version: "1.0.0"
signals:
  Cr:
    ref: creatinine
    expected_unit: mg/dL
trends:
  cr_avg:
    expr: sma(Cr, 48h)
  cr_delta:
    expr: delta(Cr, 48h)
logic:
  aki_risk:
    when: cr_avg >= 1.5 OR cr_delta >= 0.3
    severity: high
```"#;

#[tokio::test]
async fn test_corrects_unknown_operator_with_yaml_validator() {
    let provider = Arc::new(
        ScriptedProvider::new("scripted").with_responses([AKI_WITH_AVG, AKI_FIXED]),
    );
    let orchestrator = orchestrator_with(provider.clone(), Arc::new(YamlValidator::new()));

    let session = orchestrator.run(request(3)).await.unwrap();
    assert_eq!(session.state, SessionState::Succeeded);
    assert_eq!(session.attempt_count(), 2);

    let first = &session.attempts[0];
    assert!(first.text.starts_with("scenario: AKI_Detection"));
    assert!(
        first.errors.iter().any(|e| e.contains("Unknown operator 'avg'")),
        "errors: {:?}",
        first.errors
    );

    let result = session.result().unwrap();
    assert!(result.valid);

    // The accepted candidate parses into a connected outline
    let report = YamlValidator::new().validate(&result.text);
    let scenario = report.scenario.expect("valid scenario");
    let outline = build_outline(&scenario);
    assert_eq!(
        outline.signal("Cr").unwrap().used_by,
        vec!["cr_avg".to_string(), "cr_delta".to_string()]
    );
    assert_eq!(
        outline.logic_rule("aki_risk").unwrap().depends_on,
        vec!["cr_avg".to_string(), "cr_delta".to_string()]
    );
}
