// src/handlers/exam.rs

use axum::{Extension, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::exam::ExamListItem,
    repo,
    utils::{jwt::Claims, respond},
};

/// Lists active exams for the student dashboard, with the caller's
/// attempt usage per exam.
pub async fn list_exams(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let exams = repo::exams::list_active(&pool).await?;
    let counts = repo::attempts::counts_by_exam(&pool, user_id).await?;

    let items: Vec<ExamListItem> = exams
        .into_iter()
        .map(|exam| {
            let attempts_used = counts.get(&exam.id).copied().unwrap_or(0);
            ExamListItem {
                id: exam.id,
                title: exam.title,
                description: exam.description,
                duration_minutes: exam.duration_minutes,
                total_marks: exam.total_marks,
                pass_mark_percent: exam.pass_mark_percent,
                max_attempts: exam.max_attempts,
                allow_review: exam.allow_review,
                attempts_used,
            }
        })
        .collect();

    Ok(respond::ok(items))
}

/// The caller's own attempt history.
pub async fn list_my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = repo::attempts::list_for_user(&pool, claims.user_id()).await?;

    Ok(respond::ok(attempts))
}
