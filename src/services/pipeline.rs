use sqlx::PgPool;

use crate::db::queries;
use crate::models::candidate::{RecordUpdate, ResumeStatus};
use crate::models::verdict::Verdict;
use crate::services::classifier::{ClassifierClient, ClassifierError, EvalMode};
use crate::services::extractor;
use crate::services::queue::ValidationJob;

/// Extracted text below this length is treated as an empty or scanned
/// document and rejected without consulting the model.
pub const MIN_TEXT_LEN: usize = 50;

pub const EMPTY_TEXT_REJECTION: &str = "Resume appears empty or scanned.";
pub const EMPTY_TEXT_DETAIL: &str = "Insufficient text content.";

/// Reason written by the reconciliation sweep when a record sat in
/// `processing` past the deadline.
pub const TIMEOUT_REJECTION: &str = "System Error: validation timed out.";

/// Terminal disposition of one processed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Accepted,
    Rejected,
    RejectedEmpty,
    SystemRejected,
}

/// Errors that abort the delivery and surface to the queue's retry policy.
/// The record is deliberately left in `processing` on these paths.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("record store write failed: {0}")]
    RecordStore(#[from] sqlx::Error),
}

/// Run one validation job to a terminal record write.
///
/// Extract -> length gate -> classify -> fold the verdict into the record.
/// Extraction failures and short text are handled locally (terminal record
/// writes); classifier and record-store failures propagate so the queue can
/// redeliver.
pub async fn run_validation(
    db: &PgPool,
    classifier: &ClassifierClient,
    job: &ValidationJob,
) -> Result<JobOutcome, PipelineError> {
    queries::mark_processing(db, &job.candidate_id, &job.resume_url).await?;

    let text = match extractor::extract_from_url(&job.resume_url).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                job_id = %job.job_id,
                candidate_id = %job.candidate_id,
                error = %err,
                "extraction failed, rejecting without charging an attempt"
            );
            let update = extraction_failure_update(&err.to_string());
            queries::apply_update(db, &job.candidate_id, &update).await?;
            return Ok(JobOutcome::SystemRejected);
        }
    };

    if !has_sufficient_text(&text) {
        tracing::info!(
            job_id = %job.job_id,
            candidate_id = %job.candidate_id,
            chars = text.chars().count(),
            "extracted text below minimum, rejecting as empty/scanned"
        );
        queries::apply_update(db, &job.candidate_id, &empty_text_update()).await?;
        return Ok(JobOutcome::RejectedEmpty);
    }

    let verdict = classifier.classify(&text, EvalMode::Scored).await?;

    let outcome = if verdict.valid {
        JobOutcome::Accepted
    } else {
        JobOutcome::Rejected
    };
    queries::apply_update(db, &job.candidate_id, &verdict_update(&verdict)).await?;
    Ok(outcome)
}

/// Whether extracted text is substantial enough to classify.
pub fn has_sufficient_text(text: &str) -> bool {
    text.chars().count() >= MIN_TEXT_LEN
}

/// Plan for an unfetchable or unparseable document: a system fault, so the
/// candidate is not charged an attempt.
pub fn extraction_failure_update(message: &str) -> RecordUpdate {
    let reason = format!("System Error: {message}");
    RecordUpdate {
        status: ResumeStatus::Rejected,
        charge_attempt: false,
        last_rejection_reason: Some(reason.clone()),
        ai_reason: Some(reason),
        ai_confidence: None,
        ai_score: None,
        clear_resume_url: true,
        stamp_completed: false,
    }
}

/// Plan for a document that parsed but carried almost no text. This one is a
/// candidate-supplied defect and charges an attempt.
pub fn empty_text_update() -> RecordUpdate {
    RecordUpdate {
        status: ResumeStatus::Rejected,
        charge_attempt: true,
        last_rejection_reason: Some(EMPTY_TEXT_REJECTION.to_string()),
        ai_reason: Some(EMPTY_TEXT_DETAIL.to_string()),
        ai_confidence: None,
        ai_score: None,
        clear_resume_url: true,
        stamp_completed: false,
    }
}

/// Fold a parsed verdict into a record write.
pub fn verdict_update(verdict: &Verdict) -> RecordUpdate {
    if verdict.valid {
        RecordUpdate {
            status: ResumeStatus::Accepted,
            charge_attempt: false,
            last_rejection_reason: None,
            ai_reason: Some(verdict.reason.clone()),
            ai_confidence: Some(verdict.confidence),
            ai_score: Some(verdict.score),
            clear_resume_url: false,
            stamp_completed: true,
        }
    } else {
        RecordUpdate {
            status: ResumeStatus::Rejected,
            charge_attempt: true,
            last_rejection_reason: Some(verdict.reason.clone()),
            ai_reason: Some(verdict.reason.clone()),
            ai_confidence: Some(verdict.confidence),
            ai_score: Some(verdict.score),
            clear_resume_url: true,
            stamp_completed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_gate_counts_characters_not_bytes() {
        assert!(!has_sufficient_text(""));
        assert!(!has_sufficient_text(&"x".repeat(MIN_TEXT_LEN - 1)));
        assert!(has_sufficient_text(&"x".repeat(MIN_TEXT_LEN)));
        // 50 two-byte characters must pass the 50-char gate.
        assert!(has_sufficient_text(&"é".repeat(MIN_TEXT_LEN)));
    }

    #[test]
    fn extraction_failure_rejects_without_charging() {
        let update = extraction_failure_update("connection refused");
        assert_eq!(update.status, ResumeStatus::Rejected);
        assert!(!update.charge_attempt);
        assert_eq!(
            update.last_rejection_reason.as_deref(),
            Some("System Error: connection refused")
        );
        assert!(update.clear_resume_url);
        assert!(!update.stamp_completed);
        assert!(update.ai_score.is_none());
    }

    #[test]
    fn empty_text_rejects_and_charges_one_attempt() {
        let update = empty_text_update();
        assert_eq!(update.status, ResumeStatus::Rejected);
        assert!(update.charge_attempt);
        assert_eq!(
            update.last_rejection_reason.as_deref(),
            Some("Resume appears empty or scanned.")
        );
        assert_eq!(update.ai_reason.as_deref(), Some("Insufficient text content."));
    }

    #[test]
    fn valid_verdict_accepts_and_copies_ai_fields() {
        let verdict = Verdict {
            valid: true,
            score: 8,
            confidence: 0.9,
            reason: "solid resume".to_string(),
        };
        let update = verdict_update(&verdict);
        assert_eq!(update.status, ResumeStatus::Accepted);
        assert!(!update.charge_attempt);
        assert_eq!(update.ai_score, Some(8));
        assert_eq!(update.ai_confidence, Some(0.9));
        assert_eq!(update.ai_reason.as_deref(), Some("solid resume"));
        assert!(update.last_rejection_reason.is_none());
        assert!(!update.clear_resume_url);
        assert!(update.stamp_completed);
    }

    #[test]
    fn invalid_verdict_rejects_charges_and_copies_reason() {
        let verdict = Verdict {
            valid: false,
            score: 2,
            confidence: 0.85,
            reason: "Text appears to be random.".to_string(),
        };
        let update = verdict_update(&verdict);
        assert_eq!(update.status, ResumeStatus::Rejected);
        assert!(update.charge_attempt);
        assert_eq!(
            update.last_rejection_reason.as_deref(),
            Some("Text appears to be random.")
        );
        assert_eq!(update.ai_reason.as_deref(), Some("Text appears to be random."));
        assert_eq!(update.ai_score, Some(2));
        assert!(update.clear_resume_url);
        assert!(update.stamp_completed);
    }

    #[test]
    fn verdict_with_defaulted_score_records_zero() {
        // Binary-mode parses default a missing score to 0; the record write
        // must store it rather than leave the column untouched.
        let verdict = Verdict {
            valid: true,
            score: 0,
            confidence: 0.9,
            reason: "ok".to_string(),
        };
        assert_eq!(verdict_update(&verdict).ai_score, Some(0));
    }

    #[test]
    fn same_verdict_plans_identical_updates() {
        let verdict = Verdict {
            valid: false,
            score: 1,
            confidence: 0.7,
            reason: "not a resume".to_string(),
        };
        assert_eq!(verdict_update(&verdict), verdict_update(&verdict));
    }
}
