// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{CreateExamRequest, UpdateExamRequest},
    models::question::{CreateQuestionRequest, UpdateQuestionRequest},
    repo,
    utils::{html, respond},
};

/// Lists all exams, active or not.
/// Admin only.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = repo::exams::list_all(&pool).await?;

    Ok(respond::ok(exams))
}

/// Creates a new exam.
/// Admin only.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Json(mut payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    payload.description = html::clean_opt(payload.description);
    payload.instructions = html::clean_opt(payload.instructions);

    let id = repo::exams::insert(&pool, &payload).await.map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        e
    })?;

    Ok((StatusCode::CREATED, respond::ok(json!({ "id": id }))))
}

/// Fetches one exam by ID.
/// Admin only.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = repo::exams::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(respond::ok(exam))
}

/// Updates an exam. Fields are optional.
/// Admin only.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let no_changes = payload.title.is_none()
        && payload.description.is_none()
        && payload.instructions.is_none()
        && payload.is_active.is_none()
        && payload.duration_minutes.is_none()
        && payload.total_marks.is_none()
        && payload.pass_mark_percent.is_none()
        && payload.max_attempts.is_none()
        && payload.randomize_questions.is_none()
        && payload.allow_review.is_none();
    if no_changes {
        return Ok(StatusCode::OK);
    }

    payload.description = html::clean_opt(payload.description);
    payload.instructions = html::clean_opt(payload.instructions);

    let rows_affected = repo::exams::update(&pool, id, payload).await.map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        e
    })?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an exam and, via cascade, its questions and attempts.
/// Admin only.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows_affected = repo::exams::delete(&pool, id).await.map_err(|e| {
        tracing::error!("Failed to delete exam: {:?}", e);
        e
    })?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists an exam's questions with full option sets, correctness visible.
/// Admin only.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    repo::exams::find(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let questions = repo::questions::list_with_options(&pool, exam_id, false, false).await?;

    Ok(respond::ok(questions))
}

/// Creates a question with its options in one transaction.
/// The option set must contain exactly one correct option.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
    Json(mut payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    repo::exams::find(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    payload.prompt = html::clean_html(&payload.prompt);
    payload.explanation = html::clean_opt(payload.explanation);
    for option in &mut payload.options {
        option.text = html::clean_html(&option.text);
    }

    let mut tx = pool.begin().await?;
    let id = repo::questions::insert_with_options(&mut tx, exam_id, &payload)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                AppError::Conflict(format!(
                    "Question number {} already exists for this exam",
                    payload.question_number
                ))
            } else {
                tracing::error!("Failed to create question: {:?}", e);
                AppError::InternalServerError(e.to_string())
            }
        })?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, respond::ok(json!({ "id": id }))))
}

/// Updates a question; a present option set replaces the old one and must
/// again contain exactly one correct option.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    repo::questions::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    payload.prompt = payload.prompt.map(|p| html::clean_html(&p));
    payload.explanation = html::clean_opt(payload.explanation);
    if let Some(options) = &mut payload.options {
        for option in options {
            option.text = html::clean_html(&option.text);
        }
    }

    let mut tx = pool.begin().await?;
    repo::questions::update(&mut tx, id, &payload).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Question number already exists for this exam".to_string())
        } else {
            tracing::error!("Failed to update question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;
    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows_affected = repo::questions::delete(&pool, id).await.map_err(|e| {
        tracing::error!("Failed to delete question: {:?}", e);
        e
    })?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists attempts across all users with account and exam context.
/// Admin only — the privileged bypass of attempt ownership.
pub async fn list_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let results = repo::attempts::list_all(&pool).await?;

    Ok(respond::ok(results))
}

/// One attempt with its graded answer rows.
/// Admin only.
pub async fn get_result(
    State(pool): State<PgPool>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = repo::attempts::find_result(&pool, attempt_id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    let answers = repo::answers::list_graded(&pool, attempt_id).await?;

    Ok(respond::ok(json!({
        "attempt": attempt,
        "answers": answers,
    })))
}
