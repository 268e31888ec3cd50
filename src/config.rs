use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised while reading an explicit configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAIConfig,
    pub ollama: OllamaConfig,
    pub generation: GenerationConfig,
    pub data: DataConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

/// OpenAI backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// Without a key the provider reports itself unavailable.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub generate_timeout_secs: u64,
    pub correct_timeout_secs: u64,
}

/// Ollama backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub generate_timeout_secs: u64,
    pub correct_timeout_secs: u64,
    /// Readiness probe against `/api/tags`.
    pub probe_timeout_secs: u64,
}

/// Self-correcting generation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_provider: String,
    pub default_max_retries: u32,
    /// Upper bound applied to client-supplied `max_retries`.
    pub max_retries_cap: u32,
    /// Deadline for a whole session, unbounded when unset.
    pub session_timeout_secs: Option<u64>,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8200,
            cors_origins: vec!["http://localhost:9806".to_string()],
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: crate::core::llm::providers::openai::DEFAULT_MODEL.to_string(),
            generate_timeout_secs: 60,
            correct_timeout_secs: 45,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: crate::core::llm::providers::ollama::DEFAULT_HOST.to_string(),
            model: crate::core::llm::providers::ollama::DEFAULT_MODEL.to_string(),
            generate_timeout_secs: 300,
            correct_timeout_secs: 120,
            probe_timeout_secs: 2,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            default_max_retries: 3,
            max_retries_cap: 10,
            session_timeout_secs: None,
        }
    }
}

impl OpenAIConfig {
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn correct_timeout(&self) -> Duration {
        Duration::from_secs(self.correct_timeout_secs)
    }
}

impl OllamaConfig {
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn correct_timeout(&self) -> Duration {
        Duration::from_secs(self.correct_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl GenerationConfig {
    /// Requested retries, defaulted and clamped to the configured cap.
    pub fn effective_retries(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_max_retries)
            .min(self.max_retries_cap)
    }

    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/psdl-inspector/config.toml`, then
    /// apply environment overrides.
    /// Falls back to defaults if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        let mut config = match Self::load_from(&config_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(ConfigError::Read { .. }) => {
                log::debug!(
                    "No config file at {}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read and parse one TOML file without fallbacks.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from environment variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = Some(url);
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(port) = lookup("PSDL_INSPECTOR_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("Ignoring invalid PSDL_INSPECTOR_PORT={port}"),
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("psdl-inspector"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("psdl-inspector").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
