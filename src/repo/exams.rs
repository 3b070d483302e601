// src/repo/exams.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::exam::{CreateExamRequest, Exam, UpdateExamRequest};

const EXAM_COLUMNS: &str = "id, title, description, instructions, is_active, duration_minutes, \
     total_marks, pass_mark_percent, max_attempts, randomize_questions, allow_review, \
     created_at, updated_at";

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Exam>, AppError> {
    let exam = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {} FROM exams WHERE id = $1",
        EXAM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(exam)
}

pub async fn find_active(pool: &PgPool, id: i64) -> Result<Option<Exam>, AppError> {
    let exam = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {} FROM exams WHERE id = $1 AND is_active = TRUE",
        EXAM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(exam)
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Exam>, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {} FROM exams WHERE is_active = TRUE ORDER BY title",
        EXAM_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(exams)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Exam>, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {} FROM exams ORDER BY id DESC",
        EXAM_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(exams)
}

pub async fn insert(pool: &PgPool, req: &CreateExamRequest) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO exams
        (title, description, instructions, is_active, duration_minutes, total_marks,
         pass_mark_percent, max_attempts, randomize_questions, allow_review)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.instructions)
    .bind(req.is_active)
    .bind(req.duration_minutes)
    .bind(req.total_marks)
    .bind(req.pass_mark_percent)
    .bind(req.max_attempts)
    .bind(req.randomize_questions)
    .bind(req.allow_review)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Partial update via a dynamic SET list. Returns rows affected.
pub async fn update(pool: &PgPool, id: i64, req: UpdateExamRequest) -> Result<u64, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = req.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = req.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(instructions) = req.instructions {
        separated.push("instructions = ");
        separated.push_bind_unseparated(instructions);
    }

    if let Some(is_active) = req.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    if let Some(duration_minutes) = req.duration_minutes {
        separated.push("duration_minutes = ");
        separated.push_bind_unseparated(duration_minutes);
    }

    if let Some(total_marks) = req.total_marks {
        separated.push("total_marks = ");
        separated.push_bind_unseparated(total_marks);
    }

    if let Some(pass_mark_percent) = req.pass_mark_percent {
        separated.push("pass_mark_percent = ");
        separated.push_bind_unseparated(pass_mark_percent);
    }

    if let Some(max_attempts) = req.max_attempts {
        separated.push("max_attempts = ");
        separated.push_bind_unseparated(max_attempts);
    }

    if let Some(randomize_questions) = req.randomize_questions {
        separated.push("randomize_questions = ");
        separated.push_bind_unseparated(randomize_questions);
    }

    if let Some(allow_review) = req.allow_review {
        separated.push("allow_review = ");
        separated.push_bind_unseparated(allow_review);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await?;

    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
