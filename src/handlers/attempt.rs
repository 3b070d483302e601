// src/handlers/attempt.rs
//
// The attempt lifecycle: start, save-answer, submit. Starting is
// idempotent while an attempt is in progress; answers are recorded
// ungraded; all grading happens at submission so nothing about
// correctness can leak mid-exam.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::{
    error::AppError,
    grading,
    models::attempt::{
        self, AttemptSummary, QuestionResult, ReviewData, ReviewOption, SaveAnswerRequest,
        StartExamData, StartExamRequest, SubmitExamRequest, SubmitResultData,
    },
    models::question::PublicQuestion,
    repo,
    state::AppState,
    utils::{jwt::Claims, respond},
};

/// Starts (or resumes) an exam attempt.
///
/// Preconditions are checked in order, each with its own failure:
/// profile exists, exam is active, attempt limit not reached. An
/// in-progress attempt for the same (user, exam) pair is reused with its
/// original expiry, so a reloaded page continues the same attempt.
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let pool = &state.pool;

    state.profile(user_id).await?.ok_or(AppError::BadRequest(
        "Profile not found. Please complete your profile first.".to_string(),
    ))?;

    let exam = repo::exams::find_active(pool, payload.exam_id)
        .await?
        .ok_or(AppError::NotFound(
            "Exam not found or is not active".to_string(),
        ))?;

    if let Some(max_attempts) = exam.max_attempts {
        let used = repo::attempts::count_for_user(pool, exam.id, user_id).await?;
        if used >= max_attempts as i64 {
            return Err(AppError::Conflict(format!(
                "You have reached the maximum number of attempts ({}) for this exam",
                max_attempts
            )));
        }
    }

    let attempt = match repo::attempts::find_in_progress(pool, exam.id, user_id).await? {
        Some(existing) => existing,
        None => {
            let now = Utc::now();
            let expires_at = now + Duration::minutes(exam.duration_minutes as i64);
            repo::attempts::insert(pool, exam.id, user_id, now, expires_at).await?
        }
    };

    let questions =
        repo::questions::list_with_options(pool, exam.id, true, exam.randomize_questions).await?;
    let public_questions: Vec<PublicQuestion> = questions.iter().map(PublicQuestion::from).collect();

    let saved_answers = repo::answers::saved_map(pool, attempt.id).await?;

    Ok(respond::ok(StartExamData {
        attempt: AttemptSummary::from(&attempt),
        exam: (&exam).into(),
        questions: public_questions,
        saved_answers,
    }))
}

/// Records one in-progress answer.
///
/// The selection is upserted on the (attempt, question) key; grading is
/// deferred entirely to submission, so the stored row carries placeholder
/// correctness/marks only.
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pool = &state.pool;

    let attempt = repo::attempts::find_owned(pool, payload.attempt_id, claims.user_id())
        .await?
        .ok_or(AppError::NotFound(
            "Attempt not found or access denied".to_string(),
        ))?;

    if attempt.status != attempt::status::IN_PROGRESS {
        return Err(AppError::Conflict(
            "This exam has already been submitted".to_string(),
        ));
    }

    if Utc::now() > attempt.expires_at {
        return Err(AppError::Conflict("This exam has expired".to_string()));
    }

    let question = repo::questions::find(pool, payload.question_id)
        .await?
        .filter(|q| q.exam_id == attempt.exam_id)
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let option_ok =
        repo::questions::option_in_question(pool, payload.option_id, question.id).await?;
    if !option_ok {
        return Err(AppError::BadRequest(
            "Invalid option for this question".to_string(),
        ));
    }

    repo::answers::upsert_selection(pool, attempt.id, question.id, payload.option_id).await?;

    Ok(respond::ok(json!({
        "message": "Answer saved",
        "question_id": payload.question_id,
        "option_id": payload.option_id,
    })))
}

/// Submits an attempt and grades it.
///
/// The client-held answer map is graded against the exam's active
/// questions; the answer rows are rewritten and the attempt finalized in
/// one transaction. An attempt past its expiry that the sweeper has not
/// reached yet is still accepted, so a client that auto-submits on its
/// timer gets graded on whatever it sent.
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pool = &state.pool;

    let attempt = repo::attempts::find_owned(pool, payload.attempt_id, claims.user_id())
        .await?
        .ok_or(AppError::NotFound(
            "Attempt not found or access denied".to_string(),
        ))?;

    if attempt.status != attempt::status::IN_PROGRESS {
        return Err(AppError::Conflict(
            "This exam has already been submitted".to_string(),
        ));
    }

    if Utc::now() > attempt.expires_at {
        tracing::info!(attempt_id = attempt.id, "grading late submission past expiry");
    }

    let exam = repo::exams::find(pool, attempt.exam_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError(format!("exam {} missing for attempt", attempt.exam_id))
        })?;

    let questions = repo::questions::list_with_options(pool, exam.id, true, false).await?;

    let outcome = grading::grade(&questions, &payload.answers);
    let pass_mark = grading::pass_mark(exam.pass_mark_percent, exam.total_marks);
    let percentage = grading::percentage(outcome.total_score, exam.total_marks);
    let passed = outcome.total_score >= pass_mark;
    let completed_at = Utc::now();

    let mut tx = pool.begin().await?;

    // Someone may have finalized this attempt between the ownership read
    // and here; the locked re-check closes that window.
    let status = repo::attempts::lock_status(&mut tx, attempt.id)
        .await?
        .ok_or(AppError::NotFound(
            "Attempt not found or access denied".to_string(),
        ))?;
    if status != attempt::status::IN_PROGRESS {
        return Err(AppError::Conflict(
            "This exam has already been submitted".to_string(),
        ));
    }

    repo::answers::replace_graded(&mut tx, attempt.id, &outcome.answers).await?;
    repo::attempts::finalize(
        &mut tx,
        attempt.id,
        attempt::status::COMPLETED,
        outcome.total_score,
        passed,
        completed_at,
    )
    .await?;

    tx.commit().await?;

    let questions_answered = outcome
        .answers
        .iter()
        .filter(|a| a.selected_option_id.is_some())
        .count();

    let review = if exam.allow_review {
        let results = questions
            .iter()
            .zip(outcome.answers.iter())
            .map(|(q, graded)| QuestionResult {
                question_id: q.question.id,
                question_number: q.question.question_number,
                prompt: q.question.prompt.clone(),
                marks: q.question.marks,
                selected_option_id: graded.selected_option_id,
                correct_option_id: graded.correct_option_id,
                is_correct: graded.is_correct,
                marks_earned: graded.marks_earned,
                explanation: q.question.explanation.clone(),
                options: q
                    .options
                    .iter()
                    .map(|o| ReviewOption {
                        id: o.id,
                        label: o.label.clone(),
                        text: o.text.clone(),
                        is_correct: o.is_correct,
                    })
                    .collect(),
            })
            .collect();
        Some(ReviewData { questions: results })
    } else {
        None
    };

    Ok(respond::ok(SubmitResultData {
        attempt_id: attempt.id,
        exam_title: exam.title,
        total_marks: exam.total_marks,
        score: outcome.total_score,
        percentage,
        pass_mark,
        pass_mark_percent: exam.pass_mark_percent,
        passed,
        completed_at,
        questions_answered,
        questions_total: questions.len(),
        questions_correct: outcome.questions_correct,
        review,
    }))
}
