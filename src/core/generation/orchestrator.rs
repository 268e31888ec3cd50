//! Generation Orchestrator
//!
//! Drives one bounded generate → validate → correct loop against a provider.
//! Validation failures consume budget and feed the next correction; provider
//! failures end the session immediately.

use std::sync::Arc;

use tracing::Instrument;

use crate::core::llm::{
    extract_candidate, LLMError, ProviderRegistry, ScenarioProvider, SCENARIO_FENCE_TAG,
};
use crate::core::validator::ScenarioValidator;

use super::session::{GenerationSession, SessionRequest, SessionResult, SessionState};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that end a session without a result
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider {provider} failed after {attempts} validated attempt(s): {source}")]
    ProviderCallFailure {
        provider: String,
        /// Attempts recorded before the failing call
        attempts: u32,
        #[source]
        source: LLMError,
    },

    #[error("Session {0} ended without a validated attempt")]
    NoAttempt(String),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs generation sessions. Cheap to share; holds only `Arc` handles.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    providers: Arc<ProviderRegistry>,
    validator: Arc<dyn ScenarioValidator>,
    fence_tag: String,
}

impl GenerationOrchestrator {
    pub fn new(providers: Arc<ProviderRegistry>, validator: Arc<dyn ScenarioValidator>) -> Self {
        Self {
            providers,
            validator,
            fence_tag: SCENARIO_FENCE_TAG.to_string(),
        }
    }

    /// Set the fence tag candidates are extracted from
    pub fn with_fence_tag(mut self, tag: impl Into<String>) -> Self {
        self.fence_tag = tag.into();
        self
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn validator(&self) -> &Arc<dyn ScenarioValidator> {
        &self.validator
    }

    /// Run a session and return its outcome.
    pub async fn run_session(
        &self,
        request: SessionRequest,
    ) -> Result<SessionResult, GenerationError> {
        let session = self.run(request).await?;
        session
            .result()
            .ok_or_else(|| GenerationError::NoAttempt(session.id.clone()))
    }

    /// Run a session and return it with its full attempt trace.
    pub async fn run(
        &self,
        request: SessionRequest,
    ) -> Result<GenerationSession, GenerationError> {
        let provider = self
            .providers
            .get(&request.provider)
            .ok_or_else(|| GenerationError::UnknownProvider(request.provider.clone()))?;

        if !provider.is_ready().await {
            tracing::warn!(provider = %request.provider, "Provider not ready");
            return Err(GenerationError::ProviderUnavailable(request.provider.clone()));
        }

        let session = GenerationSession::new(request);
        let span = tracing::info_span!(
            "generation_session",
            session_id = %session.id,
            provider = provider.id(),
        );

        self.drive(session, provider).instrument(span).await
    }

    async fn drive(
        &self,
        mut session: GenerationSession,
        provider: Arc<dyn ScenarioProvider>,
    ) -> Result<GenerationSession, GenerationError> {
        tracing::info!(
            max_retries = session.request.max_retries,
            model = session.request.model.as_deref().unwrap_or(provider.default_model()),
            "Starting generation session"
        );

        let start = std::time::Instant::now();

        loop {
            let model = session.request.model.as_deref();

            let raw = match session.state {
                SessionState::Generating => {
                    provider
                        .generate(
                            &session.request.prompt,
                            session.request.clinical_context.as_deref(),
                            model,
                        )
                        .await
                }
                SessionState::Correcting => {
                    let (previous, errors) = match session.last_attempt() {
                        Some(last) => (last.text.as_str(), last.errors.as_slice()),
                        None => ("", &[][..]),
                    };
                    provider
                        .correct(previous, errors, &session.request.prompt, model)
                        .await
                }
                _ => break,
            };

            let raw = match raw {
                Ok(raw) => raw,
                Err(source) => {
                    session.fail();
                    tracing::error!(
                        attempts = session.attempt_count(),
                        error = %source,
                        "Provider call failed"
                    );
                    return Err(GenerationError::ProviderCallFailure {
                        provider: provider.id().to_string(),
                        attempts: session.attempt_count(),
                        source,
                    });
                }
            };

            session.state = SessionState::Validating;
            let candidate = extract_candidate(&raw, &self.fence_tag);
            let report = self.validator.validate(&candidate);
            let attempt = session.record_attempt(candidate, &report);

            tracing::info!(
                attempt = attempt.index,
                errors = attempt.errors.len(),
                warnings = attempt.warnings.len(),
                "Validated candidate"
            );

            session.settle();
        }

        tracing::info!(
            state = ?session.state,
            attempts = session.attempt_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation session finished"
        );

        Ok(session)
    }
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("providers", &self.providers)
            .field("validator", &self.validator.name())
            .field("fence_tag", &self.fence_tag)
            .finish()
    }
}
