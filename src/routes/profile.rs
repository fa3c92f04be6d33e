use axum::extract::State;
use axum::Json;

use crate::models::Profile;

use super::AppState;

/// GET /api/profile: the owner's portfolio record, as consumed by the
/// static pages.
pub async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json((*state.profile).clone())
}
