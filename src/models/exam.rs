// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    pub title: String,

    pub description: Option<String>,

    /// Shown to the student before starting.
    pub instructions: Option<String>,

    /// Students can only see and start active exams.
    pub is_active: bool,

    pub duration_minutes: i32,

    pub total_marks: i32,

    /// Percentage threshold; the absolute pass mark is derived at grading.
    pub pass_mark_percent: i32,

    /// None means unlimited attempts.
    pub max_attempts: Option<i32>,

    /// Shuffle question order per fetch. Never persisted.
    pub randomize_questions: bool,

    /// Gates post-submission disclosure of correct answers.
    pub allow_review: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending an exam to a student (excludes authoring-side fields).
#[derive(Debug, Serialize)]
pub struct PublicExam {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_mark_percent: i32,
    pub allow_review: bool,
    pub instructions: Option<String>,
}

impl From<&Exam> for PublicExam {
    fn from(exam: &Exam) -> Self {
        PublicExam {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            duration_minutes: exam.duration_minutes,
            total_marks: exam.total_marks,
            pass_mark_percent: exam.pass_mark_percent,
            allow_review: exam.allow_review,
            instructions: exam.instructions.clone(),
        }
    }
}

/// One row of the student dashboard listing.
#[derive(Debug, Serialize)]
pub struct ExamListItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_mark_percent: i32,
    pub max_attempts: Option<i32>,
    pub allow_review: bool,
    /// How many attempts the caller has already used, any status.
    pub attempts_used: i64,
}

/// DTO for creating a new exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 20000))]
    pub instructions: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,
    #[validate(range(min = 1, max = 10000))]
    pub total_marks: i32,
    #[validate(range(min = 0, max = 100))]
    pub pass_mark_percent: i32,
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: Option<i32>,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default = "default_true")]
    pub allow_review: bool,
}

fn default_true() -> bool {
    true
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 20000))]
    pub instructions: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 1, max = 10000))]
    pub total_marks: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub pass_mark_percent: Option<i32>,
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: Option<i32>,
    pub randomize_questions: Option<bool>,
    pub allow_review: Option<bool>,
}
