// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub exam_id: i64,

    /// Ordinal within the exam, unique per exam.
    pub question_number: i32,

    pub prompt: String,

    /// Marks awarded for a correct answer. All-or-nothing.
    pub marks: i32,

    /// Shown in post-submission review when the exam allows it.
    pub explanation: Option<String>,

    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,

    pub question_id: i64,

    /// Short display label, e.g. "A".
    pub label: String,

    pub text: String,

    /// Exactly one option per question carries this flag.
    /// Enforced at authoring time, not at runtime.
    pub is_correct: bool,

    pub display_order: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A question with its full option set. Admin/grading view.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

/// DTO for sending an option to a student during an exam.
/// The correctness flag never leaves the server on this path.
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub label: String,
    pub text: String,
    pub display_order: i32,
}

/// DTO for sending a question to a student during an exam
/// (excludes explanation and option correctness).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_number: i32,
    pub prompt: String,
    pub marks: i32,
    pub options: Vec<PublicOption>,
}

impl From<&QuestionWithOptions> for PublicQuestion {
    fn from(q: &QuestionWithOptions) -> Self {
        PublicQuestion {
            id: q.question.id,
            question_number: q.question.question_number,
            prompt: q.question.prompt.clone(),
            marks: q.question.marks,
            options: q
                .options
                .iter()
                .map(|o| PublicOption {
                    id: o.id,
                    label: o.label.clone(),
                    text: o.text.clone(),
                    display_order: o.display_order,
                })
                .collect(),
        }
    }
}

/// DTO for one option within question authoring.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 8))]
    pub label: String,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub display_order: Option<i32>,
}

/// DTO for creating a new question with its options.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(range(min = 1, max = 10000))]
    pub question_number: i32,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(range(min = 1, max = 100))]
    pub marks: i32,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(nested, custom(function = validate_option_set))]
    pub options: Vec<CreateOptionRequest>,
}

fn default_true() -> bool {
    true
}

/// DTO for updating a question. Fields are optional; a present `options`
/// replaces the whole option set.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(range(min = 1, max = 10000))]
    pub question_number: Option<i32>,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub marks: Option<i32>,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
    pub is_active: Option<bool>,
    #[validate(nested, custom(function = validate_option_set))]
    pub options: Option<Vec<CreateOptionRequest>>,
}

/// An option set needs at least two choices and exactly one correct answer.
fn validate_option_set(options: &[CreateOptionRequest]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("too_few_options"));
    }
    if options.len() > 10 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    let correct = options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
        return Err(validator::ValidationError::new("exactly_one_correct_required"));
    }
    Ok(())
}
