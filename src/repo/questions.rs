// src/repo/questions.rs

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::question::{
    AnswerOption, CreateOptionRequest, CreateQuestionRequest, Question, QuestionWithOptions,
    UpdateQuestionRequest,
};

const QUESTION_COLUMNS: &str =
    "id, exam_id, question_number, prompt, marks, explanation, is_active, created_at";

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Question>, AppError> {
    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM questions WHERE id = $1",
        QUESTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(question)
}

/// Questions of one exam; active only when `only_active`. `randomize`
/// shuffles per fetch and is never persisted.
pub async fn list_for_exam(
    pool: &PgPool,
    exam_id: i64,
    only_active: bool,
    randomize: bool,
) -> Result<Vec<Question>, AppError> {
    let order = if randomize { "RANDOM()" } else { "question_number" };
    let active = if only_active { "AND is_active = TRUE" } else { "" };

    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM questions WHERE exam_id = $1 {} ORDER BY {}",
        QUESTION_COLUMNS, active, order
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

/// All options of an exam's questions, ordered for display.
async fn options_for_exam(pool: &PgPool, exam_id: i64) -> Result<Vec<AnswerOption>, AppError> {
    let options = sqlx::query_as::<_, AnswerOption>(
        r#"
        SELECT o.id, o.question_id, o.label, o.text, o.is_correct, o.display_order, o.created_at
        FROM options o
        JOIN questions q ON o.question_id = q.id
        WHERE q.exam_id = $1
        ORDER BY o.display_order, o.id
        "#,
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

/// Questions with their option sets, grouped in question order.
pub async fn list_with_options(
    pool: &PgPool,
    exam_id: i64,
    only_active: bool,
    randomize: bool,
) -> Result<Vec<QuestionWithOptions>, AppError> {
    let questions = list_for_exam(pool, exam_id, only_active, randomize).await?;
    let options = options_for_exam(pool, exam_id).await?;

    let mut by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    Ok(questions
        .into_iter()
        .map(|question| {
            let options = by_question.remove(&question.id).unwrap_or_default();
            QuestionWithOptions { question, options }
        })
        .collect())
}

/// Does this option belong to this question? Referential check for
/// save-answer; the client is not trusted.
pub async fn option_in_question(
    pool: &PgPool,
    option_id: i64,
    question_id: i64,
) -> Result<bool, AppError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM options WHERE id = $1 AND question_id = $2")
            .bind(option_id)
            .bind(question_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// Inserts a question and its option set. Run inside a transaction.
pub async fn insert_with_options(
    conn: &mut PgConnection,
    exam_id: i64,
    req: &CreateQuestionRequest,
) -> Result<i64, sqlx::Error> {
    let (question_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO questions (exam_id, question_number, prompt, marks, explanation, is_active)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(exam_id)
    .bind(req.question_number)
    .bind(&req.prompt)
    .bind(req.marks)
    .bind(&req.explanation)
    .bind(req.is_active)
    .fetch_one(&mut *conn)
    .await?;

    insert_options(conn, question_id, &req.options).await?;

    Ok(question_id)
}

async fn insert_options(
    conn: &mut PgConnection,
    question_id: i64,
    options: &[CreateOptionRequest],
) -> Result<(), sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO options (question_id, label, text, is_correct, display_order) ");

    builder.push_values(options.iter().enumerate(), |mut b, (i, option)| {
        b.push_bind(question_id)
            .push_bind(&option.label)
            .push_bind(&option.text)
            .push_bind(option.is_correct)
            .push_bind(option.display_order.unwrap_or(i as i32));
    });

    builder.build().execute(conn).await?;

    Ok(())
}

/// Partial question update; a present option set replaces the old one
/// wholesale. The caller verifies the question exists and runs this
/// inside a transaction.
pub async fn update(
    conn: &mut PgConnection,
    id: i64,
    req: &UpdateQuestionRequest,
) -> Result<(), sqlx::Error> {
    let has_field_changes = req.question_number.is_some()
        || req.prompt.is_some()
        || req.marks.is_some()
        || req.explanation.is_some()
        || req.is_active.is_some();

    if has_field_changes {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(question_number) = req.question_number {
            separated.push("question_number = ");
            separated.push_bind_unseparated(question_number);
        }

        if let Some(prompt) = &req.prompt {
            separated.push("prompt = ");
            separated.push_bind_unseparated(prompt);
        }

        if let Some(marks) = req.marks {
            separated.push("marks = ");
            separated.push_bind_unseparated(marks);
        }

        if let Some(explanation) = &req.explanation {
            separated.push("explanation = ");
            separated.push_bind_unseparated(explanation);
        }

        if let Some(is_active) = req.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder.build().execute(&mut *conn).await?;
    }

    if let Some(options) = &req.options {
        sqlx::query("DELETE FROM options WHERE question_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        insert_options(conn, id, options).await?;
    }

    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
