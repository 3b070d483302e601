// src/sweeper.rs
//
// Server-side expiry finalization. Clients auto-submit on their own
// timers, but a client that never calls submit would otherwise leave its
// attempt in_progress forever. This task periodically grades such
// attempts from their saved answer trail and marks them expired. The
// grace window past expiry lets a slow client's manual submit land first
// and win.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::grading;
use crate::models::attempt::{self, Attempt};
use crate::repo;

/// Run the expiry sweeper as a background task.
pub async fn run_expiry_sweeper(pool: PgPool, config: Config) {
    let interval = Duration::from_secs(config.sweep_interval_secs);

    tracing::info!(
        interval_secs = config.sweep_interval_secs,
        grace_secs = config.sweep_grace_secs,
        "Starting attempt expiry sweeper"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        match sweep_expired(&pool, config.sweep_grace_secs).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Finalized expired attempts"),
            Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
        }
    }
}

/// Scan for stale in-progress attempts and finalize each. Returns how
/// many were finalized; per-attempt failures are logged and skipped so
/// one bad row cannot stall the sweep.
pub async fn sweep_expired(pool: &PgPool, grace_secs: u64) -> Result<u64, AppError> {
    let cutoff = Utc::now() - chrono::Duration::seconds(grace_secs as i64);

    let stale = repo::attempts::list_stale(pool, cutoff).await?;

    let mut finalized = 0;
    for attempt in stale {
        match finalize_expired(pool, &attempt).await {
            Ok(true) => finalized += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    attempt_id = attempt.id,
                    error = %e,
                    "Failed to finalize expired attempt"
                );
            }
        }
    }

    Ok(finalized)
}

/// Grades one stale attempt from its saved answers and marks it expired.
/// Returns false when the attempt was finalized by someone else first.
async fn finalize_expired(pool: &PgPool, stale: &Attempt) -> Result<bool, AppError> {
    let exam = repo::exams::find(pool, stale.exam_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError(format!("exam {} missing for attempt", stale.exam_id))
        })?;

    let questions = repo::questions::list_with_options(pool, exam.id, true, false).await?;
    let saved = repo::answers::saved_map(pool, stale.id).await?;

    let outcome = grading::grade(&questions, &saved);
    let pass_mark = grading::pass_mark(exam.pass_mark_percent, exam.total_marks);
    let passed = outcome.total_score >= pass_mark;

    let mut tx = pool.begin().await?;

    // A manual submit may have won the race since the scan.
    let status = repo::attempts::lock_status(&mut tx, stale.id).await?;
    if status.as_deref() != Some(attempt::status::IN_PROGRESS) {
        return Ok(false);
    }

    repo::answers::replace_graded(&mut tx, stale.id, &outcome.answers).await?;
    repo::attempts::finalize(
        &mut tx,
        stale.id,
        attempt::status::EXPIRED,
        outcome.total_score,
        passed,
        Utc::now(),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        attempt_id = stale.id,
        score = outcome.total_score,
        "Expired attempt finalized from saved answers"
    );

    Ok(true)
}
