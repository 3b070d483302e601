// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{MeResponse, UpdateProfileRequest},
    repo,
    state::AppState,
    utils::{jwt::Claims, respond},
};

/// Get the current user's account and profile.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let user = repo::users::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let profile = state.profile(user_id).await?;

    Ok(respond::ok(MeResponse {
        id: user.id,
        email: user.email,
        role: user.role,
        full_name: profile.as_ref().map(|p| p.full_name.clone()),
        organisation: profile.as_ref().and_then(|p| p.organisation.clone()),
        created_at: user.created_at,
    }))
}

/// Create or update the current user's profile.
///
/// Starting an exam requires a profile, so this is the first stop for a
/// fresh account. Refreshes the cache entry so the change is visible to
/// the next start-exam check immediately.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let profile = repo::profiles::upsert(
        &state.pool,
        user_id,
        &payload.full_name,
        payload.organisation.as_deref(),
    )
    .await?;

    state.profiles.insert(user_id, profile.clone());

    Ok(respond::ok(profile))
}
