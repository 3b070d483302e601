// src/repo/attempts.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::attempt::{AdminResultRow, Attempt, MyAttempt};

const ATTEMPT_COLUMNS: &str = "id, exam_id, user_id, status, started_at, expires_at, \
     completed_at, score, passed, created_at";

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Attempt>, AppError> {
    let attempt = sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {} FROM attempts WHERE id = $1",
        ATTEMPT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

/// The attempt only if it belongs to the acting user. Ownership and
/// existence are indistinguishable to the caller.
pub async fn find_owned(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<Attempt>, AppError> {
    let attempt = sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {} FROM attempts WHERE id = $1 AND user_id = $2",
        ATTEMPT_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

pub async fn find_in_progress(
    pool: &PgPool,
    exam_id: i64,
    user_id: i64,
) -> Result<Option<Attempt>, AppError> {
    let attempt = sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {} FROM attempts WHERE exam_id = $1 AND user_id = $2 AND status = 'in_progress'",
        ATTEMPT_COLUMNS
    ))
    .bind(exam_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

/// Prior attempts of any status count against the limit.
pub async fn count_for_user(pool: &PgPool, exam_id: i64, user_id: i64) -> Result<i64, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM attempts WHERE exam_id = $1 AND user_id = $2")
            .bind(exam_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Attempt counts per exam for one user, for the dashboard listing.
pub async fn counts_by_exam(pool: &PgPool, user_id: i64) -> Result<HashMap<i64, i64>, AppError> {
    let rows: Vec<(i64, i64)> =
        sqlx::query_as("SELECT exam_id, COUNT(*) FROM attempts WHERE user_id = $1 GROUP BY exam_id")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().collect())
}

pub async fn insert(
    pool: &PgPool,
    exam_id: i64,
    user_id: i64,
    started_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<Attempt, AppError> {
    let attempt = sqlx::query_as::<_, Attempt>(&format!(
        r#"
        INSERT INTO attempts (exam_id, user_id, status, started_at, expires_at)
        VALUES ($1, $2, 'in_progress', $3, $4)
        RETURNING {}
        "#,
        ATTEMPT_COLUMNS
    ))
    .bind(exam_id)
    .bind(user_id)
    .bind(started_at)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(attempt)
}

/// Locks the attempt row and returns its current status. Used by grading
/// write paths to re-check state inside their transaction.
pub async fn lock_status(conn: &mut PgConnection, id: i64) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT status FROM attempts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

    Ok(row.map(|(status,)| status))
}

/// Finalizes an attempt with its graded result. Run inside the same
/// transaction as the answer rewrite.
pub async fn finalize(
    conn: &mut PgConnection,
    id: i64,
    status: &str,
    score: i32,
    passed: bool,
    completed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attempts
        SET status = $2, score = $3, passed = $4, completed_at = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(score)
    .bind(passed)
    .bind(completed_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// The caller's attempt history, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<MyAttempt>, AppError> {
    let attempts = sqlx::query_as::<_, MyAttempt>(
        r#"
        SELECT a.id, a.exam_id, e.title AS exam_title, e.total_marks,
               a.status, a.started_at, a.completed_at, a.score, a.passed
        FROM attempts a
        JOIN exams e ON a.exam_id = e.id
        WHERE a.user_id = $1
        ORDER BY a.started_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(attempts)
}

/// All attempts across users for the admin results listing, newest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminResultRow>, AppError> {
    let rows = sqlx::query_as::<_, AdminResultRow>(
        r#"
        SELECT a.id, a.exam_id, e.title AS exam_title,
               a.user_id, u.email, p.full_name,
               a.status, a.started_at, a.completed_at, a.score, a.passed
        FROM attempts a
        JOIN exams e ON a.exam_id = e.id
        JOIN users u ON a.user_id = u.id
        LEFT JOIN profiles p ON p.user_id = u.id
        ORDER BY a.started_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One attempt for the admin review detail.
pub async fn find_result(pool: &PgPool, id: i64) -> Result<Option<AdminResultRow>, AppError> {
    let row = sqlx::query_as::<_, AdminResultRow>(
        r#"
        SELECT a.id, a.exam_id, e.title AS exam_title,
               a.user_id, u.email, p.full_name,
               a.status, a.started_at, a.completed_at, a.score, a.passed
        FROM attempts a
        JOIN exams e ON a.exam_id = e.id
        JOIN users u ON a.user_id = u.id
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE a.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// In-progress attempts whose expiry passed before the cutoff; the
/// sweeper's scan query.
pub async fn list_stale(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Attempt>, AppError> {
    let attempts = sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {} FROM attempts WHERE status = 'in_progress' AND expires_at < $1",
        ATTEMPT_COLUMNS
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(attempts)
}
