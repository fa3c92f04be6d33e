mod chat;
mod profile;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::models::Profile;
use crate::services::config_service::Config;

/// State shared by all routes. The relay itself is stateless across
/// requests; this only carries process-lifetime data.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub profile: Arc<Profile>,
    pub system_prompt: Arc<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::relay_chat))
        .route("/api/profile", get(profile::get_profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
