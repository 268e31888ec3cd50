//! Scenario Provider Trait
//!
//! Defines the trait that all scenario-generating LLM backends implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::Result;

/// Point-in-time availability of one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub id: String,
    pub name: String,
    pub available: bool,
    pub model: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
}

/// Trait that all scenario providers must implement
///
/// `generate` and `correct` return the raw model response; fence extraction
/// is applied by the caller.
#[async_trait]
pub trait ScenarioProvider: Send + Sync {
    /// Get the provider's unique identifier
    fn id(&self) -> &str;

    /// Get the provider's display name
    fn name(&self) -> &str;

    /// Model used when the caller does not override it
    fn default_model(&self) -> &str;

    /// Check whether the provider can take requests right now
    async fn is_ready(&self) -> bool;

    /// Draft a scenario from a natural-language request
    async fn generate(
        &self,
        prompt: &str,
        clinical_context: Option<&str>,
        model: Option<&str>,
    ) -> Result<String>;

    /// Revise a candidate given the validator's error messages
    async fn correct(
        &self,
        previous: &str,
        errors: &[String],
        original_prompt: &str,
        model: Option<&str>,
    ) -> Result<String>;

    /// Models this provider can serve
    async fn list_models(&self) -> Vec<String> {
        vec![self.default_model().to_string()]
    }

    async fn status(&self) -> ProviderStatus {
        let available = self.is_ready().await;
        let models = if available {
            self.list_models().await
        } else {
            Vec::new()
        };

        ProviderStatus {
            id: self.id().to_string(),
            name: self.name().to_string(),
            available,
            model: available.then(|| self.default_model().to_string()),
            models,
        }
    }
}
