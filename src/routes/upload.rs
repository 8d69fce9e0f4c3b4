use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::models::validation::UploadResponse;
use crate::routes::validate::internal_error;

/// Upload size threshold; enforced here so oversized documents never reach
/// extraction.
const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// POST /api/upload-resume — store a resume PDF for later validation.
///
/// Multipart fields: `candidateId` (text) and `file` (the PDF). Returns the
/// stored object's URL for the follow-up queue-validation call.
pub async fn upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let mut candidate_id: Option<String> = None;
    let mut file_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("candidateId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed candidateId field"))?;
                candidate_id = Some(value);
            }
            Some("file") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("Malformed file field"))?;
                file_data = Some(data);
            }
            _ => {}
        }
    }

    let candidate_id = candidate_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| bad_request("Missing candidateId"))?;
    let data = file_data.ok_or_else(|| bad_request("Missing file"))?;

    if !data.starts_with(b"%PDF") {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "error": "Only PDF resumes are accepted" })),
        ));
    }
    if data.len() > MAX_RESUME_BYTES {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "File size must be less than 5MB" })),
        ));
    }

    let (key, resume_url) = state
        .storage
        .store_resume(&candidate_id, &data)
        .await
        .map_err(internal_error)?;

    tracing::info!(
        candidate_id = %candidate_id,
        key = %key,
        bytes = data.len(),
        "resume stored"
    );

    Ok(Json(UploadResponse {
        success: true,
        resume_url,
        key,
    }))
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
