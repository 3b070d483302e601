// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest},
    repo,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
        respond,
    },
};

/// Registers a new student account.
///
/// Hashes the password using Argon2 before storing it. When a full name
/// is supplied the profile is seeded in the same request, so the account
/// is immediately eligible to start exams.
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = repo::users::insert(&pool, &payload.email, &hashed_password, "student")
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                AppError::Conflict(format!("Email '{}' is already registered", payload.email))
            } else {
                tracing::error!("Failed to register user: {:?}", e);
                AppError::InternalServerError(e.to_string())
            }
        })?;

    if let Some(full_name) = &payload.full_name {
        repo::profiles::upsert(&pool, user.id, full_name, None).await?;
    }

    Ok((StatusCode::CREATED, respond::ok(user)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = repo::users::find_by_email(&pool, &payload.email)
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(respond::ok(json!({
        "token": token,
        "type": "Bearer",
        "role": user.role,
    })))
}
