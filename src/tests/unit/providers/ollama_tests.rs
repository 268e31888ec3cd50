//! Ollama Provider Unit Tests
//!
//! Tests for the Ollama local LLM provider implementation including:
//! - API request formatting
//! - Response parsing
//! - Readiness probe and model listing
//! - Host configuration

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::llm::{LLMError, OllamaProvider, ScenarioProvider};

fn tags() -> serde_json::Value {
    json!({
        "models": [
            { "name": "mistral-small:latest", "size": 1 },
            { "name": "llama3.2:latest", "size": 2 }
        ]
    })
}

// =============================================================================
// Provider Identity Tests
// =============================================================================

#[test]
fn test_provider_identity() {
    let provider = OllamaProvider::new(
        "http://localhost:11434".to_string(),
        "llama3.2".to_string(),
    );
    assert_eq!(provider.id(), "ollama");
    assert_eq!(provider.name(), "Ollama");
    assert_eq!(provider.default_model(), "llama3.2");
}

#[test]
fn test_localhost_convenience_constructor() {
    let provider = OllamaProvider::localhost("mistral-small".to_string());
    assert_eq!(provider.default_model(), "mistral-small");
}

// =============================================================================
// Readiness Tests
// =============================================================================

#[tokio::test]
async fn test_ready_when_tags_respond() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags()))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "mistral-small".to_string());
    assert!(provider.is_ready().await);
}

#[tokio::test]
async fn test_not_ready_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "mistral-small".to_string());
    assert!(!provider.is_ready().await);
}

#[tokio::test]
async fn test_not_ready_when_unreachable() {
    // Port 9 (discard) is not served locally
    let provider = OllamaProvider::new("http://127.0.0.1:9".to_string(), "mistral-small".to_string());
    assert!(!provider.is_ready().await);
}

#[tokio::test]
async fn test_status_lists_installed_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags()))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(format!("{}/", server.uri()), "mistral-small".to_string());
    let status = provider.status().await;

    assert!(status.available);
    assert_eq!(status.model.as_deref(), Some("mistral-small"));
    assert_eq!(
        status.models,
        vec!["mistral-small:latest".to_string(), "llama3.2:latest".to_string()]
    );
}

// =============================================================================
// Request Formatting Tests
// =============================================================================

#[tokio::test]
async fn test_generate_request_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "mistral-small",
            "stream": false,
            "options": { "temperature": 0.3 }
        })))
        .and(body_string_contains("User request: Detect sepsis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "mistral-small",
            "response": "scenario: Sepsis",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "mistral-small".to_string());
    let text = provider.generate("Detect sepsis", None, None).await.unwrap();

    assert_eq!(text, "scenario: Sepsis");
}

#[tokio::test]
async fn test_correct_uses_lower_temperature_and_override() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "options": { "temperature": 0.2 }
        })))
        .and(body_string_contains("VALIDATION ERRORS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "fixed",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "mistral-small".to_string());
    let errors = vec!["Unknown term 'x'".to_string()];
    let text = provider
        .correct("logic: {}", &errors, "Detect sepsis", Some("llama3.2"))
        .await
        .unwrap();

    assert_eq!(text, "fixed");
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[tokio::test]
async fn test_missing_model_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string("model 'nope' not found"),
        )
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "nope".to_string());
    let result = provider.generate("Detect sepsis", None, None).await;

    match result {
        Err(LLMError::ApiError { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_response_field_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "mistral-small".to_string());
    let result = provider.generate("Detect sepsis", None, None).await;

    assert!(matches!(result, Err(LLMError::InvalidResponse(_))));
}
