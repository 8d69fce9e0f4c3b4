use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::candidate::{CandidateRecord, RecordUpdate, ResumeStatus};

/// Point-read of a candidate's record.
pub async fn get_record(
    pool: &PgPool,
    candidate_id: &str,
) -> Result<Option<CandidateRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT candidate_id, status, resume_url, attempts, last_rejection_reason,
               ai_reason, ai_confidence, ai_score,
               processing_started_at, processing_completed_at, updated_at
        FROM candidates
        WHERE candidate_id = $1
        "#,
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await?;

    row.map(record_from_row).transpose()
}

/// The initial transition: mark a candidate's record `processing` for the
/// submitted file. Upserts so a first-time submission creates the row, and
/// stamps `processing_started_at` so the reconciliation sweep has a deadline
/// to measure from. Idempotent; a worker redelivery re-stamps harmlessly.
pub async fn mark_processing(
    pool: &PgPool,
    candidate_id: &str,
    resume_url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO candidates (candidate_id, status, resume_url, processing_started_at, updated_at)
        VALUES ($1, 'processing', $2, NOW(), NOW())
        ON CONFLICT (candidate_id) DO UPDATE
        SET status = 'processing',
            resume_url = $2,
            processing_started_at = NOW(),
            processing_completed_at = NULL,
            updated_at = NOW()
        "#,
    )
    .bind(candidate_id)
    .bind(resume_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// Apply a terminal update planned by the pipeline in a single write.
/// Columns the plan leaves as `None` keep their stored value.
pub async fn apply_update(
    pool: &PgPool,
    candidate_id: &str,
    update: &RecordUpdate,
) -> Result<(), sqlx::Error> {
    let attempt_delta: i32 = if update.charge_attempt { 1 } else { 0 };

    sqlx::query(
        r#"
        UPDATE candidates
        SET status = $2,
            attempts = attempts + $3,
            last_rejection_reason = COALESCE($4, last_rejection_reason),
            ai_reason = COALESCE($5, ai_reason),
            ai_confidence = COALESCE($6, ai_confidence),
            ai_score = COALESCE($7, ai_score),
            resume_url = CASE WHEN $8 THEN NULL ELSE resume_url END,
            processing_completed_at = CASE WHEN $9 THEN NOW() ELSE processing_completed_at END,
            updated_at = NOW()
        WHERE candidate_id = $1
        "#,
    )
    .bind(candidate_id)
    .bind(update.status.to_string())
    .bind(attempt_delta)
    .bind(update.last_rejection_reason.as_deref())
    .bind(update.ai_reason.as_deref())
    .bind(update.ai_confidence)
    .bind(update.ai_score)
    .bind(update.clear_resume_url)
    .bind(update.stamp_completed)
    .execute(pool)
    .await?;

    Ok(())
}

/// Force-reject records stuck in `processing` since before `cutoff`.
///
/// Runs outside the per-job hot path; no attempt is charged since the
/// candidate is not at fault for a lost delivery. Returns the affected
/// candidate ids for logging.
pub async fn reconcile_stuck_processing(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    reason: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        UPDATE candidates
        SET status = 'rejected',
            last_rejection_reason = $2,
            ai_reason = $2,
            resume_url = NULL,
            processing_completed_at = NOW(),
            updated_at = NOW()
        WHERE status = 'processing'
          AND processing_started_at IS NOT NULL
          AND processing_started_at < $1
        RETURNING candidate_id
        "#,
    )
    .bind(cutoff)
    .bind(reason)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| row.try_get("candidate_id"))
        .collect()
}

fn record_from_row(row: PgRow) -> Result<CandidateRecord, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse::<ResumeStatus>()
        .unwrap_or(ResumeStatus::NoResume);

    Ok(CandidateRecord {
        candidate_id: row.try_get("candidate_id")?,
        status,
        resume_url: row.try_get("resume_url")?,
        attempts: row.try_get("attempts")?,
        last_rejection_reason: row.try_get("last_rejection_reason")?,
        ai_reason: row.try_get("ai_reason")?,
        ai_confidence: row.try_get("ai_confidence")?,
        ai_score: row.try_get("ai_score")?,
        processing_started_at: row.try_get("processing_started_at")?,
        processing_completed_at: row.try_get("processing_completed_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
