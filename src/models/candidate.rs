use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of a candidate's resume submission.
///
/// `Processing` holds only between enqueue and the worker's terminal write;
/// the reconciliation sweep force-rejects records stuck past the deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ResumeStatus {
    NoResume,
    Processing,
    Accepted,
    Rejected,
}

/// The shared per-candidate record backing the portal UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
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
    pub updated_at: DateTime<Utc>,
}

/// A planned partial update of a [`CandidateRecord`].
///
/// The pipeline decides one of these per job and the record store applies it
/// in a single write. `None` fields leave the stored column untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub status: ResumeStatus,
    /// Charge one terminal rejection against the candidate's quota.
    pub charge_attempt: bool,
    pub last_rejection_reason: Option<String>,
    pub ai_reason: Option<String>,
    pub ai_confidence: Option<f64>,
    pub ai_score: Option<i32>,
    /// Rejections drop the pointer to the submitted file.
    pub clear_resume_url: bool,
    pub stamp_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_db_representation() {
        assert_eq!(ResumeStatus::NoResume.to_string(), "no_resume");
        assert_eq!(ResumeStatus::Processing.to_string(), "processing");
        assert_eq!("accepted".parse::<ResumeStatus>().unwrap(), ResumeStatus::Accepted);
        assert_eq!("rejected".parse::<ResumeStatus>().unwrap(), ResumeStatus::Rejected);
    }

    #[test]
    fn status_serializes_to_portal_facing_names() {
        // The dashboard matches on these exact strings.
        assert_eq!(serde_json::to_string(&ResumeStatus::Processing).unwrap(), "\"Processing\"");
        assert_eq!(serde_json::to_string(&ResumeStatus::NoResume).unwrap(), "\"NoResume\"");
    }
}
