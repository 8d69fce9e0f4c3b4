use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::{CandidateRecord, ResumeStatus};

/// Body of POST /api/queue-validation.
///
/// Fields are optional so a missing key surfaces as the documented 400
/// response instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueValidationRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

/// Response after enqueueing a validation job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueValidationResponse {
    pub success: bool,
    pub message: String,
    pub job_id: Uuid,
}

/// Body of POST /api/screen-resume (synchronous binary screening).
#[derive(Debug, Deserialize)]
pub struct ScreenRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Candidate-facing view of the validation record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStatusResponse {
    pub candidate_id: String,
    pub status: ResumeStatus,
    pub resume_url: Option<String>,
    pub attempts: i32,
    pub last_rejection_reason: Option<String>,
    pub ai_reason: Option<String>,
    pub ai_confidence: Option<f64>,
    pub ai_score: Option<i32>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
}

impl From<CandidateRecord> for CandidateStatusResponse {
    fn from(record: CandidateRecord) -> Self {
        Self {
            candidate_id: record.candidate_id,
            status: record.status,
            resume_url: record.resume_url,
            attempts: record.attempts,
            last_rejection_reason: record.last_rejection_reason,
            ai_reason: record.ai_reason,
            ai_confidence: record.ai_confidence,
            ai_score: record.ai_score,
            processing_started_at: record.processing_started_at,
            processing_completed_at: record.processing_completed_at,
        }
    }
}

/// Response after storing an uploaded resume.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub resume_url: String,
    pub key: String,
}

/// Body of POST /api/send-approval-email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub login_url: Option<String>,
}
