//! Generation session state and attempt trace.

use serde::{Deserialize, Serialize};

use crate::core::validator::ValidationReport;

/// Lifecycle of one generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Generating,
    Validating,
    Correcting,
    Succeeded,
    Exhausted,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Exhausted | SessionState::Failed
        )
    }
}

/// One validated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationAttempt {
    /// 1-based
    pub index: u32,
    pub text: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl GenerationAttempt {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Caller-supplied parameters of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub prompt: String,
    pub clinical_context: Option<String>,
    pub provider: String,
    pub model: Option<String>,
    /// Correction rounds allowed after the first draft
    pub max_retries: u32,
}

impl SessionRequest {
    pub fn new(prompt: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            clinical_context: None,
            provider: provider.into(),
            model: None,
            max_retries: 3,
        }
    }

    pub fn with_clinical_context(mut self, context: impl Into<String>) -> Self {
        self.clinical_context = Some(context.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// A session in progress, with its attempt trace.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    pub id: String,
    pub request: SessionRequest,
    pub state: SessionState,
    pub attempts: Vec<GenerationAttempt>,
}

impl GenerationSession {
    pub fn new(request: SessionRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            state: SessionState::Generating,
            attempts: Vec::new(),
        }
    }

    /// Total attempts allowed, first draft included.
    pub fn budget(&self) -> u32 {
        self.request.max_retries.saturating_add(1)
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn has_budget(&self) -> bool {
        self.attempt_count() < self.budget()
    }

    pub fn last_attempt(&self) -> Option<&GenerationAttempt> {
        self.attempts.last()
    }

    /// Append the validated candidate as the next attempt.
    pub fn record_attempt(&mut self, text: String, report: &ValidationReport) -> &GenerationAttempt {
        let attempt = GenerationAttempt {
            index: self.attempt_count() + 1,
            text,
            errors: report.error_messages(),
            warnings: report.warning_messages(),
        };
        self.attempts.push(attempt);
        &self.attempts[self.attempts.len() - 1]
    }

    /// Settle the state after a validation pass.
    pub fn settle(&mut self) -> SessionState {
        self.state = match self.last_attempt() {
            Some(attempt) if attempt.is_valid() => SessionState::Succeeded,
            Some(_) if self.has_budget() => SessionState::Correcting,
            Some(_) => SessionState::Exhausted,
            None => SessionState::Generating,
        };
        self.state
    }

    pub fn fail(&mut self) {
        self.state = SessionState::Failed;
    }

    /// Outcome view of the session, from its last attempt.
    ///
    /// `None` until an attempt has been recorded.
    pub fn result(&self) -> Option<SessionResult> {
        self.last_attempt().map(|last| SessionResult {
            session_id: self.id.clone(),
            text: last.text.clone(),
            valid: last.is_valid(),
            errors: last.errors.clone(),
            warnings: last.warnings.clone(),
            attempts: self.attempt_count(),
        })
    }
}

/// Final outcome returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: String,
    /// Last candidate, valid or not
    pub text: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub attempts: u32,
}
