// src/repo/profiles.rs

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::user::Profile;

pub async fn find(pool: &PgPool, user_id: i64) -> Result<Option<Profile>, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT user_id, full_name, organisation, created_at, updated_at
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub async fn upsert(
    pool: &PgPool,
    user_id: i64,
    full_name: &str,
    organisation: Option<&str>,
) -> Result<Profile, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id, full_name, organisation)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            organisation = EXCLUDED.organisation,
            updated_at = NOW()
        RETURNING user_id, full_name, organisation, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(full_name)
    .bind(organisation)
    .fetch_one(pool)
    .await?;

    Ok(profile)
}
