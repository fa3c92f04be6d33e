use std::sync::Arc;

use anyhow::Result;

use folio::models;
use folio::routes::{self, AppState};
use folio::services::config_service::{Config, API_KEY_VAR};
use folio::services::prompt_service;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let profile = models::load_profile(&config.profile_path).map_err(anyhow::Error::msg)?;
    let system_prompt = prompt_service::compose(&profile);

    if config.api_key.is_none() {
        tracing::warn!(
            "{} is not set; chat requests will fail until it is configured",
            API_KEY_VAR
        );
    }

    let state = AppState {
        config: config.clone(),
        profile: Arc::new(profile),
        system_prompt: Arc::new(system_prompt),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("folio listening on {}", config.bind_addr);
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
