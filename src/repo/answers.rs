// src/repo/answers.rs

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::grading::GradedAnswer;
use crate::models::attempt::AttemptAnswer;

/// The in-progress selections of an attempt, question -> option.
pub async fn saved_map(pool: &PgPool, attempt_id: i64) -> Result<HashMap<i64, i64>, AppError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT question_id, selected_option_id
        FROM attempt_answers
        WHERE attempt_id = $1 AND selected_option_id IS NOT NULL
        "#,
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Records an in-progress selection. The (attempt, question) conflict key
/// makes repeated saves last-writer-wins; correctness and marks stay at
/// their placeholder values until grading.
pub async fn upsert_selection(
    pool: &PgPool,
    attempt_id: i64,
    question_id: i64,
    option_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO attempt_answers
            (attempt_id, question_id, selected_option_id, is_correct, marks_earned, graded)
        VALUES ($1, $2, $3, FALSE, 0, FALSE)
        ON CONFLICT (attempt_id, question_id) DO UPDATE SET
            selected_option_id = EXCLUDED.selected_option_id,
            is_correct = FALSE,
            marks_earned = 0,
            graded = FALSE,
            updated_at = NOW()
        "#,
    )
    .bind(attempt_id)
    .bind(question_id)
    .bind(option_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replaces the attempt's answer rows with the freshly graded set: delete
/// then bulk insert, one row per graded question (null selection when
/// unanswered). Run inside the finalize transaction.
pub async fn replace_graded(
    conn: &mut PgConnection,
    attempt_id: i64,
    graded: &[GradedAnswer],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM attempt_answers WHERE attempt_id = $1")
        .bind(attempt_id)
        .execute(&mut *conn)
        .await?;

    if graded.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO attempt_answers \
         (attempt_id, question_id, selected_option_id, is_correct, marks_earned, graded) ",
    );

    builder.push_values(graded, |mut b, answer| {
        b.push_bind(attempt_id)
            .push_bind(answer.question_id)
            .push_bind(answer.selected_option_id)
            .push_bind(answer.is_correct)
            .push_bind(answer.marks_earned)
            .push_bind(true);
    });

    builder.build().execute(conn).await?;

    Ok(())
}

/// Graded rows of an attempt for admin review. Placeholder rows from an
/// in-progress attempt are excluded on purpose.
pub async fn list_graded(pool: &PgPool, attempt_id: i64) -> Result<Vec<AttemptAnswer>, AppError> {
    let answers = sqlx::query_as::<_, AttemptAnswer>(
        r#"
        SELECT id, attempt_id, question_id, selected_option_id, is_correct,
               marks_earned, graded, created_at, updated_at
        FROM attempt_answers
        WHERE attempt_id = $1 AND graded = TRUE
        ORDER BY question_id
        "#,
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(answers)
}
