//! Ollama Provider Implementation
//!
//! Local LLM provider using Ollama's `/api/generate` completion endpoint.

use crate::core::llm::error::{LLMError, Result};
use crate::core::llm::prompts::{self, CORRECT_TEMPERATURE, GENERATE_TEMPERATURE};
use crate::core::llm::provider::ScenarioProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral-small";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Ollama provider for local LLM inference
pub struct OllamaProvider {
    host: String,
    model: String,
    generate_timeout: Duration,
    correct_timeout: Duration,
    probe_timeout: Duration,
    client: Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(host: String, model: String) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            model,
            generate_timeout: Duration::from_secs(300),
            correct_timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(2),
            client: Client::new(),
        }
    }

    /// Create with default localhost
    pub fn localhost(model: String) -> Self {
        Self::new(DEFAULT_HOST.to_string(), model)
    }

    /// Set per-call timeouts for generation and correction
    pub fn with_timeouts(mut self, generate: Duration, correct: Duration) -> Self {
        self.generate_timeout = generate;
        self.correct_timeout = correct;
        self
    }

    /// Set the timeout of the readiness probe
    pub fn with_probe_timeout(mut self, probe: Duration) -> Self {
        self.probe_timeout = probe;
        self
    }

    async fn fetch_tags(&self, timeout: Duration) -> Result<TagsResponse> {
        let url = format!("{}/api/tags", self.host);
        let resp = self.client.get(&url).timeout(timeout).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LLMError::from_status(status, text));
        }

        Ok(resp.json().await?)
    }

    async fn complete(
        &self,
        prompt: String,
        model: Option<&str>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.host);
        let model = model.unwrap_or(&self.model);

        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": temperature
            }
        });

        log::debug!("Ollama request: model={} timeout={:?}", model, timeout);

        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LLMError::from_status(status, text));
        }

        let json: serde_json::Value = resp.json().await?;

        json["response"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LLMError::InvalidResponse("Missing response".to_string()))
    }
}

#[async_trait]
impl ScenarioProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn is_ready(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        clinical_context: Option<&str>,
        model: Option<&str>,
    ) -> Result<String> {
        let full_prompt = format!(
            "{}\n\n{}",
            prompts::system_message(),
            prompts::generation_request(prompt, clinical_context)
        );

        self.complete(full_prompt, model, GENERATE_TEMPERATURE, self.generate_timeout)
            .await
    }

    async fn correct(
        &self,
        previous: &str,
        errors: &[String],
        original_prompt: &str,
        model: Option<&str>,
    ) -> Result<String> {
        let prompt = prompts::correction_prompt(previous, errors, original_prompt);

        self.complete(prompt, model, CORRECT_TEMPERATURE, self.correct_timeout)
            .await
    }

    async fn list_models(&self) -> Vec<String> {
        match self.fetch_tags(self.probe_timeout.max(Duration::from_secs(5))).await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                log::warn!("Failed to list Ollama models: {}", e);
                Vec::new()
            }
        }
    }
}
