// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::models::exam::PublicExam;
use crate::models::question::PublicQuestion;

/// Attempt lifecycle states.
pub mod status {
    pub const IN_PROGRESS: &str = "in_progress";
    pub const COMPLETED: &str = "completed";
    pub const EXPIRED: &str = "expired";
}

/// Represents the 'attempts' table in the database.
/// One student's timed instance of taking a specific exam.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub exam_id: i64,
    pub user_id: i64,

    /// 'in_progress', 'completed' or 'expired'.
    /// in_progress -> completed happens exactly once, on submit;
    /// in_progress -> expired is the sweeper's path.
    pub status: String,

    pub started_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,

    pub score: Option<i32>,
    pub passed: Option<bool>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'attempt_answers' table in the database.
///
/// While the attempt is in progress a row is a placeholder recording only
/// the selection (`graded = false`, zero marks); grading rewrites the set
/// with `graded = true` and real correctness/marks.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
    pub is_correct: bool,
    pub marks_earned: i32,
    pub graded: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting an exam.
#[derive(Debug, Deserialize)]
pub struct StartExamRequest {
    pub exam_id: i64,
}

/// DTO for saving one in-progress answer.
#[derive(Debug, Deserialize)]
pub struct SaveAnswerRequest {
    pub attempt_id: i64,
    pub question_id: i64,
    pub option_id: i64,
}

/// DTO for submitting an attempt.
///
/// The client-held answer map is authoritative for grading; the
/// save-answer trail is not consulted on this path.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub attempt_id: i64,
    /// question_id -> selected option_id
    pub answers: HashMap<i64, i64>,
}

/// Attempt fields exposed when starting/resuming an exam.
#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub status: String,
}

impl From<&Attempt> for AttemptSummary {
    fn from(a: &Attempt) -> Self {
        AttemptSummary {
            id: a.id,
            started_at: a.started_at,
            expires_at: a.expires_at,
            status: a.status.clone(),
        }
    }
}

/// Response data for the start operation.
#[derive(Debug, Serialize)]
pub struct StartExamData {
    pub attempt: AttemptSummary,
    pub exam: PublicExam,
    pub questions: Vec<PublicQuestion>,
    /// question_id -> selected option_id, restoring a resumed session.
    pub saved_answers: HashMap<i64, i64>,
}

/// One option in the post-submission review, correctness revealed.
#[derive(Debug, Serialize)]
pub struct ReviewOption {
    pub id: i64,
    pub label: String,
    pub text: String,
    pub is_correct: bool,
}

/// Per-question result in the post-submission review.
#[derive(Debug, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub question_number: i32,
    pub prompt: String,
    pub marks: i32,
    pub selected_option_id: Option<i64>,
    pub correct_option_id: Option<i64>,
    pub is_correct: bool,
    pub marks_earned: i32,
    pub explanation: Option<String>,
    pub options: Vec<ReviewOption>,
}

#[derive(Debug, Serialize)]
pub struct ReviewData {
    pub questions: Vec<QuestionResult>,
}

/// Response data for the submit operation.
#[derive(Debug, Serialize)]
pub struct SubmitResultData {
    pub attempt_id: i64,
    pub exam_title: String,
    pub total_marks: i32,
    pub score: i32,
    pub percentage: i32,
    pub pass_mark: i32,
    pub pass_mark_percent: i32,
    pub passed: bool,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub questions_answered: usize,
    pub questions_total: usize,
    pub questions_correct: usize,
    /// Present if and only if the exam's allow-review flag is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewData>,
}

/// One row of the student's own attempt history.
#[derive(Debug, Serialize, FromRow)]
pub struct MyAttempt {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    pub total_marks: i32,
    pub status: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub passed: Option<bool>,
}

/// One row of the admin results listing, joined across users and exams.
#[derive(Debug, Serialize, FromRow)]
pub struct AdminResultRow {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    pub user_id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub status: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub passed: Option<bool>,
}
