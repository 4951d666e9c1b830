// Manual reconnection endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use super::common::{error_response, ApiResponse, ApiResult, ReasonQuery};
use crate::constants::reconnection::ALREADY_IN_PROGRESS;
use crate::reconnection::{ReconnectionReason, ReconnectionResult};
use crate::web::AppState;

/// Run a reconnection and wait for its outcome. Unrecognized reasons fall
/// back to `unknown`; a concurrent request gets 409.
pub async fn trigger_reconnection(
    Query(query): Query<ReasonQuery>,
    State(state): State<AppState>,
) -> ApiResult<ReconnectionResult> {
    let reason = query
        .reason
        .as_deref()
        .map(|r| r.parse().unwrap_or(ReconnectionReason::Unknown))
        .unwrap_or(ReconnectionReason::Manual);

    info!("Manual reconnection requested via API ({})", reason);
    let result = state.monitor.trigger_manual_reconnection(reason).await;

    if result.error.as_deref() == Some(ALREADY_IN_PROGRESS) {
        return Err(error_response(
            StatusCode::CONFLICT,
            ALREADY_IN_PROGRESS.to_string(),
        ));
    }

    let message = if result.success {
        format!("Reconnected after {} attempt(s)", result.attempts)
    } else {
        format!(
            "Reconnection failed after {} attempt(s): {}",
            result.attempts,
            result.error.as_deref().unwrap_or("unknown error")
        )
    };
    Ok(Json(ApiResponse::success(result).with_message(message)))
}
