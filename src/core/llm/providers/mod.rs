//! Scenario Provider Implementations
//!
//! Concrete implementations of the `ScenarioProvider` trait, the canonical
//! provider metadata table, and the registry that resolves provider ids.
//!
//! Adding a new provider requires:
//! 1. A new entry in `PROVIDERS`
//! 2. The provider implementation file
//! 3. Its construction in `ProviderRegistry::from_config`

pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;

use std::sync::Arc;

use indexmap::IndexMap;

use super::provider::{ProviderStatus, ScenarioProvider};
use crate::config::AppConfig;

// ── Auth method ─────────────────────────────────────────────────────────────

/// How a provider authenticates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AuthMethod {
    /// Standard API key.
    ApiKey,
    /// Host URL only (Ollama).
    HostOnly,
}

// ── Provider metadata ───────────────────────────────────────────────────────

/// Static metadata for a known provider.
#[derive(Clone, Debug)]
pub struct ProviderMeta {
    pub id: &'static str,
    pub display_name: &'static str,
    pub auth_method: AuthMethod,
    pub default_model: &'static str,
}

impl ProviderMeta {
    pub fn needs_api_key(&self) -> bool {
        self.auth_method == AuthMethod::ApiKey
    }

    pub fn needs_host(&self) -> bool {
        self.auth_method == AuthMethod::HostOnly
    }
}

/// Canonical table of all known providers.
pub const PROVIDERS: &[ProviderMeta] = &[
    ProviderMeta {
        id: "openai",
        display_name: "OpenAI",
        auth_method: AuthMethod::ApiKey,
        default_model: openai::DEFAULT_MODEL,
    },
    ProviderMeta {
        id: "ollama",
        display_name: "Ollama (Local)",
        auth_method: AuthMethod::HostOnly,
        default_model: ollama::DEFAULT_MODEL,
    },
];

/// Look up provider metadata by id.
pub fn provider_meta(id: &str) -> Option<&'static ProviderMeta> {
    PROVIDERS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Immutable set of configured providers, keyed by lowercase id.
///
/// Built once at startup and shared through `Arc`.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn ScenarioProvider>>,
    default_provider: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own id. A later registration with the
    /// same id replaces the earlier one.
    pub fn with_provider(mut self, provider: Arc<dyn ScenarioProvider>) -> Self {
        let id = provider.id().to_ascii_lowercase();
        if self.default_provider.is_none() {
            self.default_provider = Some(id.clone());
        }
        self.providers.insert(id, provider);
        self
    }

    pub fn with_default(mut self, id: impl Into<String>) -> Self {
        self.default_provider = Some(id.into().to_ascii_lowercase());
        self
    }

    /// Build the OpenAI and Ollama adapters from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let openai = OpenAIProvider::new(
            config.openai.api_key.clone(),
            config.openai.model.clone(),
            config.openai.base_url.clone(),
        )
        .with_timeouts(
            config.openai.generate_timeout(),
            config.openai.correct_timeout(),
        );

        let ollama = OllamaProvider::new(config.ollama.host.clone(), config.ollama.model.clone())
            .with_timeouts(
                config.ollama.generate_timeout(),
                config.ollama.correct_timeout(),
            )
            .with_probe_timeout(config.ollama.probe_timeout());

        if config.openai.api_key.is_none() {
            log::info!("OPENAI_API_KEY not set; OpenAI provider will report unavailable");
        }

        Self::new()
            .with_provider(Arc::new(openai))
            .with_provider(Arc::new(ollama))
            .with_default(config.generation.default_provider.clone())
    }

    /// Resolve a provider id, ignoring case.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ScenarioProvider>> {
        self.providers.get(&id.to_ascii_lowercase()).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Current status of every registered provider, in registration order.
    pub async fn statuses(&self) -> Vec<ProviderStatus> {
        let mut statuses = Vec::with_capacity(self.providers.len());
        for provider in self.providers.values() {
            statuses.push(provider.status().await);
        }
        statuses
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("default_provider", &self.default_provider)
            .finish()
    }
}
