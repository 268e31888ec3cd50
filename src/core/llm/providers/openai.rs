//! OpenAI Provider Implementation
//!
//! Chat-completions backend. Also works against OpenAI-compatible servers
//! through a custom base URL.

use crate::core::llm::error::{LLMError, Result};
use crate::core::llm::prompts::{self, CORRECT_TEMPERATURE, GENERATE_TEMPERATURE};
use crate::core::llm::provider::ScenarioProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_TOKENS: u32 = 2000;

/// OpenAI provider
pub struct OpenAIProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    generate_timeout: Duration,
    correct_timeout: Duration,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(api_key: Option<String>, model: String, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            generate_timeout: Duration::from_secs(60),
            correct_timeout: Duration::from_secs(45),
            client: Client::new(),
        }
    }

    pub fn gpt4o_mini(api_key: String) -> Self {
        Self::new(Some(api_key), DEFAULT_MODEL.to_string(), None)
    }

    /// Set per-call timeouts for generation and correction
    pub fn with_timeouts(mut self, generate: Duration, correct: Duration) -> Self {
        self.generate_timeout = generate;
        self.correct_timeout = correct;
        self
    }

    async fn complete(
        &self,
        messages: Vec<serde_json::Value>,
        model: Option<&str>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LLMError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let model = model.unwrap_or(&self.model);

        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": MAX_TOKENS,
        });

        log::debug!("OpenAI request: model={} timeout={:?}", model, timeout);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LLMError::from_status(status.as_u16(), text));
        }

        let json: serde_json::Value = resp.json().await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LLMError::InvalidResponse("Missing content".to_string()))
    }
}

#[async_trait]
impl ScenarioProvider for OpenAIProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn is_ready(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        clinical_context: Option<&str>,
        model: Option<&str>,
    ) -> Result<String> {
        let messages = vec![
            serde_json::json!({
                "role": "system",
                "content": prompts::system_message(),
            }),
            serde_json::json!({
                "role": "user",
                "content": prompts::generation_request(prompt, clinical_context),
            }),
        ];

        self.complete(messages, model, GENERATE_TEMPERATURE, self.generate_timeout)
            .await
    }

    async fn correct(
        &self,
        previous: &str,
        errors: &[String],
        original_prompt: &str,
        model: Option<&str>,
    ) -> Result<String> {
        let messages = vec![serde_json::json!({
            "role": "user",
            "content": prompts::correction_prompt(previous, errors, original_prompt),
        })];

        self.complete(messages, model, CORRECT_TEMPERATURE, self.correct_timeout)
            .await
    }
}
