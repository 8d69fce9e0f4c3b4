use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::models::validation::ApprovalEmailRequest;
use crate::services::mailer::ApprovalNotice;

/// POST /api/send-approval-email — send login credentials to an approved
/// candidate. Shares the host process with the pipeline but is otherwise
/// independent of it.
pub async fn send_approval_email(
    State(state): State<AppState>,
    Json(request): Json<ApprovalEmailRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing required fields" })),
            ))
        }
    };

    let notice = ApprovalNotice {
        email,
        name: request.name.unwrap_or_default(),
        roll_number: request.roll_number.unwrap_or_default(),
        password,
        login_url: request.login_url.unwrap_or_default(),
    };

    match state.mailer.send_approval(&notice).await {
        Ok(()) => {
            tracing::info!(email = %notice.email, "approval email sent");
            Ok(Json(
                json!({ "success": true, "message": "Email sent successfully" }),
            ))
        }
        Err(err) => {
            tracing::error!(email = %notice.email, error = %err, "failed to send approval email");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to send email" })),
            ))
        }
    }
}
