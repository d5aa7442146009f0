use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    extract::AppJson,
    profile::dto::{hours_explored, Profile, ProfileStats, UpdateProfileRequest},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, AppError> {
    let user = state
        .accounts
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let changes = payload.into_changes();
    let user = state
        .accounts
        .update_profile(user_id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    info!(%user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileStats>, AppError> {
    let counts = state.itineraries.counts_for_user(user_id).await?;
    Ok(Json(ProfileStats {
        saved_itineraries: counts.itineraries,
        activities: counts.activities,
        hours_explored: hours_explored(counts.activities),
    }))
}
