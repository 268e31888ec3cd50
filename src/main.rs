use std::sync::Arc;

use anyhow::Context;

use psdl_inspector::api::{self, AppState};
use psdl_inspector::config::AppConfig;
use psdl_inspector::core::llm::ProviderRegistry;
use psdl_inspector::core::validator::YamlValidator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();

    // Initialize logging
    let _log_guard = psdl_inspector::core::logging::init(&config.data_dir());
    log::info!("PSDL Inspector v{} starting", psdl_inspector::VERSION);

    let providers = Arc::new(ProviderRegistry::from_config(&config));
    let validator = Arc::new(YamlValidator::new());
    let state = Arc::new(AppState::new(
        providers,
        validator,
        config.generation.clone(),
    ));

    api::serve(&config, state)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
