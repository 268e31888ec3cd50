//! LLM Client Module
//!
//! Provider adapters that draft and correct PSDL scenarios.
//!
//! # Module Structure
//!
//! - `provider`: the `ScenarioProvider` trait and `ProviderStatus`
//! - `error`: adapter error type
//! - `prompts`: system prompt, worked examples and request templates
//! - `extract`: candidate extraction from fenced responses
//! - `providers`: OpenAI and Ollama implementations plus the registry

pub mod error;
pub mod extract;
pub mod prompts;
pub mod provider;
pub mod providers;

pub use error::{LLMError, Result};
pub use extract::{extract_candidate, SCENARIO_FENCE_TAG};
pub use provider::{ProviderStatus, ScenarioProvider};
pub use providers::{OllamaProvider, OpenAIProvider, ProviderRegistry};
