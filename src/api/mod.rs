//! HTTP API
//!
//! Validation, outline, export and generation endpoints served with axum.
//! Handlers are thin: they decode the request, call into `core`, and map
//! errors through [`ApiError`].

mod error;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{AppConfig, GenerationConfig};
use crate::core::export::{self, AuditInfo, CertifiedBundle, ExportFormat};
use crate::core::generation::{GenerationOrchestrator, SessionRequest, SessionResult};
use crate::core::llm::{ProviderRegistry, ProviderStatus};
use crate::core::scenario::{build_outline, Outline, Scenario};
use crate::core::validator::{ScenarioValidator, ValidationIssue, ValidationReport};

// ============================================================================
// State
// ============================================================================

/// Shared, read-only handler state.
pub struct AppState {
    pub orchestrator: GenerationOrchestrator,
    pub providers: Arc<ProviderRegistry>,
    pub validator: Arc<dyn ScenarioValidator>,
    pub generation: GenerationConfig,
}

impl AppState {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        validator: Arc<dyn ScenarioValidator>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            orchestrator: GenerationOrchestrator::new(providers.clone(), validator.clone()),
            providers,
            validator,
            generation,
        }
    }

    /// Validate `content` and require a parsed scenario.
    fn parse(&self, content: &str) -> Result<(Scenario, ValidationReport), ApiError> {
        let report = self.validator.validate(content);
        match report.scenario.clone() {
            Some(scenario) => Ok((scenario, report)),
            None => {
                let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
                Err(ApiError::BadRequest(messages.join("; ")))
            }
        }
    }
}

// ============================================================================
// Router
// ============================================================================

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router.
pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/api/version", get(version))
        .route("/api/validate", post(validate))
        .route("/api/outline", post(outline))
        .route("/api/export/bundle", post(export_bundle))
        .route("/api/generate/status", get(generation_status))
        .route("/api/generate/scenario", post(generate_scenario))
        .layer(ServiceBuilder::new().layer(cors_layer(cors_origins)))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &AppConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state, &config.server.cors_origins);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("PSDL Inspector API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub parsed: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub content: String,
    #[serde(default)]
    pub format: ExportFormat,
    pub intent: Option<String>,
    pub rationale: Option<String>,
    pub provenance: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub clinical_context: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub session_id: String,
    pub yaml: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub attempts: u32,
}

impl From<SessionResult> for GenerateResponse {
    fn from(result: SessionResult) -> Self {
        Self {
            session_id: result.session_id,
            yaml: result.text,
            valid: result.valid,
            errors: result.errors,
            warnings: result.warnings,
            attempts: result.attempts,
        }
    }
}

/// Aggregate availability of all providers.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationStatus {
    pub available: bool,
    pub default_provider: Option<String>,
    pub providers: Vec<ProviderStatus>,
}

impl GenerationStatus {
    /// The configured default wins while it is available; otherwise the
    /// first available provider is suggested.
    pub fn from_statuses(providers: Vec<ProviderStatus>, configured: Option<&str>) -> Self {
        let is_available = |id: &str| providers.iter().any(|p| p.available && p.id == id);

        let default_provider = match configured {
            Some(id) if is_available(id) => Some(id.to_string()),
            _ => providers
                .iter()
                .find(|p| p.available)
                .map(|p| p.id.clone())
                .or_else(|| configured.map(str::to_string)),
        };

        Self {
            available: providers.iter().any(|p| p.available),
            default_provider,
            providers,
        }
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": crate::NAME,
        "version": crate::VERSION,
    }))
}

async fn version(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "inspector": crate::VERSION,
        "validator": state.validator.name(),
        "validator_version": state.validator.version(),
    }))
}

async fn validate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContentRequest>,
) -> Json<ValidationResponse> {
    let report = state.validator.validate(&request.content);

    Json(ValidationResponse {
        valid: report.is_valid(),
        parsed: report.scenario.as_ref().map(Scenario::to_json),
        errors: report.errors,
        warnings: report.warnings,
    })
}

async fn outline(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContentRequest>,
) -> Result<Json<Outline>, ApiError> {
    let (scenario, _) = state.parse(&request.content)?;
    Ok(Json(build_outline(&scenario)))
}

async fn export_bundle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<CertifiedBundle>, ApiError> {
    let (scenario, report) = state.parse(&request.content)?;

    let audit = AuditInfo {
        intent: request.intent,
        rationale: request.rationale,
        provenance: request.provenance,
    };

    let bundle = export::certify(
        &scenario,
        &request.content,
        &report,
        state.validator.as_ref(),
        audit,
        request.format,
    );

    tracing::info!(scenario = %scenario.name, checksum = %bundle.checksum, "Certified bundle exported");

    Ok(Json(bundle))
}

async fn generation_status(State(state): State<Arc<AppState>>) -> Json<GenerationStatus> {
    let statuses = state.providers.statuses().await;
    Json(GenerationStatus::from_statuses(
        statuses,
        state.providers.default_provider(),
    ))
}

async fn generate_scenario(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let provider = request
        .provider
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.generation.default_provider.clone());

    let mut session = SessionRequest::new(request.prompt, provider.to_ascii_lowercase())
        .with_max_retries(state.generation.effective_retries(request.max_retries));
    if let Some(context) = request.clinical_context {
        session = session.with_clinical_context(context);
    }
    if let Some(model) = request.model.filter(|m| !m.trim().is_empty()) {
        session = session.with_model(model);
    }

    let run = state.orchestrator.run_session(session);
    let result = match state.generation.session_timeout() {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .map_err(|_| ApiError::Timeout(limit.as_secs()))??,
        None => run.await?,
    };

    Ok(Json(result.into()))
}
