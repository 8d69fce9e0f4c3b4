use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::validation::{
    CandidateStatusResponse, QueueValidationRequest, QueueValidationResponse, ScreenRequest,
};
use crate::models::verdict::Verdict;
use crate::services::classifier::EvalMode;
use crate::services::pipeline;
use crate::services::queue::ValidationJob;

/// POST /api/queue-validation — enqueue an async validation job.
///
/// Replies as soon as the job is durable; the upload-triggering client shows
/// a non-blocking "Processing" state while validation runs out of band.
pub async fn queue_validation(
    State(state): State<AppState>,
    Json(request): Json<QueueValidationRequest>,
) -> Result<Json<QueueValidationResponse>, (StatusCode, Json<Value>)> {
    let (candidate_id, resume_url) = match (request.user_id, request.resume_url) {
        (Some(user_id), Some(resume_url)) if !user_id.is_empty() && !resume_url.is_empty() => {
            (user_id, resume_url)
        }
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing userId or resumeUrl" })),
            ))
        }
    };

    // Initial transition: the record reads `processing` from the moment the
    // job is durable, not from when a worker first picks it up.
    queries::mark_processing(&state.db, &candidate_id, &resume_url)
        .await
        .map_err(internal_error)?;

    let job = ValidationJob::new(candidate_id.clone(), resume_url);
    state.queue.enqueue(&job).await.map_err(internal_error)?;

    metrics::counter!("validation_jobs_total").increment(1);
    if let Ok(depth) = state.queue.queue_depth().await {
        metrics::gauge!("validation_queue_depth").set(depth as f64);
    }

    tracing::info!(
        job_id = %job.job_id,
        candidate_id = %candidate_id,
        "validation job queued"
    );

    Ok(Json(QueueValidationResponse {
        success: true,
        message: "Resume queued for validation".to_string(),
        job_id: job.job_id,
    }))
}

/// GET /api/candidates/{candidate_id}/status — candidate-facing record view.
pub async fn candidate_status(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> Result<Json<CandidateStatusResponse>, (StatusCode, Json<Value>)> {
    let record = queries::get_record(&state.db, &candidate_id)
        .await
        .map_err(internal_error)?;

    match record {
        Some(record) => Ok(Json(record.into())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Unknown candidate" })),
        )),
    }
}

/// POST /api/screen-resume — synchronous lightweight screening.
///
/// Classifies already-extracted text in binary mode and returns the verdict
/// directly; no queue, no record writes.
pub async fn screen_resume(
    State(state): State<AppState>,
    Json(request): Json<ScreenRequest>,
) -> Result<Json<Verdict>, (StatusCode, Json<Value>)> {
    let text = request.text.unwrap_or_default();
    if !pipeline::has_sufficient_text(&text) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "reason": "Insufficient text content identified." })),
        ));
    }

    match state.classifier.classify(&text, EvalMode::Binary).await {
        Ok(verdict) => Ok(Json(verdict)),
        Err(err) => {
            tracing::error!(error = %err, "screening classification failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "valid": false, "reason": "AI Service Error" })),
            ))
        }
    }
}

pub(crate) fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, Json<Value>) {
    tracing::error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
}
