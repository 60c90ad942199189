use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rajbari_ai::{
    CredentialSource, FallbackStore, GeminiClient, RajbariConfig, api::AppState, telemetry, web,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional single argument: path to a config file
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = RajbariConfig::load_from_path(config_path)?;
    telemetry::init(&config.logging)?;

    let store = match &config.data.fallback_path {
        Some(path) => FallbackStore::from_path(path)?,
        None => FallbackStore::embedded()?,
    };
    let backend = GeminiClient::new(&config.gemini).context("Failed to create Gemini client")?;
    let credentials = CredentialSource::Env(config.gemini.api_key_env.clone());

    if credentials.read().is_none() {
        tracing::warn!(
            "{} is not set; AI routes will answer with API_KEY_MISSING until it is",
            config.gemini.api_key_env
        );
    }

    let state = AppState::new(
        Arc::new(backend),
        Arc::new(store),
        credentials,
        &config.gemini,
    );
    web::run(state, &config).await
}
