//! Test doubles for the generation pipeline
//!
//! - `ScriptedProvider`: replays a fixed queue of provider responses and
//!   records every call it receives
//! - `MarkerValidator`: treats any candidate containing `INVALID` as failing,
//!   with one error naming the candidate

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::llm::{LLMError, Result, ScenarioProvider};
use crate::core::scenario::Scenario;
use crate::core::validator::{ScenarioValidator, ValidationIssue, ValidationReport};

// ============================================================================
// Scripted Provider
// ============================================================================

/// One recorded provider call
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Generate {
        prompt: String,
        clinical_context: Option<String>,
        model: Option<String>,
    },
    Correct {
        previous: String,
        errors: Vec<String>,
        original_prompt: String,
        model: Option<String>,
    },
}

/// Provider that answers from a queue, in call order.
///
/// Once the queue is empty every further call fails with `InvalidResponse`.
pub struct ScriptedProvider {
    id: String,
    ready: AtomicBool,
    responses: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    generate_calls: AtomicU32,
    correct_calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ready: AtomicBool::new(true),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            generate_calls: AtomicU32::new(0),
            correct_calls: AtomicU32::new(0),
        }
    }

    /// Queue successful responses
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut queue = self.responses.lock().unwrap();
            queue.extend(responses.into_iter().map(|r| Ok(r.into())));
        }
        self
    }

    /// Queue a failing call
    pub fn then_fail(self, error: LLMError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn not_ready(self) -> Self {
        self.ready.store(false, Ordering::SeqCst);
        self
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn correct_calls(&self) -> u32 {
        self.correct_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> u32 {
        self.generate_calls() + self.correct_calls()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::InvalidResponse("script exhausted".to_string())))
    }
}

#[async_trait]
impl ScenarioProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn generate(
        &self,
        prompt: &str,
        clinical_context: Option<&str>,
        model: Option<&str>,
    ) -> Result<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall::Generate {
            prompt: prompt.to_string(),
            clinical_context: clinical_context.map(str::to_string),
            model: model.map(str::to_string),
        });
        self.next_response()
    }

    async fn correct(
        &self,
        previous: &str,
        errors: &[String],
        original_prompt: &str,
        model: Option<&str>,
    ) -> Result<String> {
        self.correct_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall::Correct {
            previous: previous.to_string(),
            errors: errors.to_vec(),
            original_prompt: original_prompt.to_string(),
            model: model.map(str::to_string),
        });
        self.next_response()
    }
}

// ============================================================================
// Marker Validator
// ============================================================================

/// Fails candidates containing `INVALID`; accepts everything else.
pub struct MarkerValidator;

impl ScenarioValidator for MarkerValidator {
    fn name(&self) -> &str {
        "marker"
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    fn validate(&self, content: &str) -> ValidationReport {
        if content.contains("INVALID") {
            ValidationReport::invalid(vec![ValidationIssue::error(format!(
                "rejected: {}",
                content.trim()
            ))])
        } else {
            ValidationReport::valid(
                Scenario::new("Accepted"),
                vec![ValidationIssue::warning("accepted with hint")],
            )
        }
    }
}
