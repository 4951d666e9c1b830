// Status and health check endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use super::common::{
    convert_snapshot_to_summary, error_response, ApiResponse, ApiResult, ProbeQuery,
};
use crate::health::{ProbeKind, ProbeResult};
use crate::monitor::MonitoringStats;
use crate::web::{AppState, StatusSummary};

/// Current snapshot; 404 until the first evaluation has run
pub async fn get_current_status(State(state): State<AppState>) -> ApiResult<StatusSummary> {
    match state.monitor.current_status().await {
        Some(snapshot) => Ok(Json(ApiResponse::success(convert_snapshot_to_summary(
            &snapshot,
        )))),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            "No status available yet".to_string(),
        )),
    }
}

pub async fn get_monitoring_stats(State(state): State<AppState>) -> ApiResult<MonitoringStats> {
    Ok(Json(ApiResponse::success(
        state.monitor.monitoring_stats().await,
    )))
}

/// Latest stored result of every probe that has run
pub async fn get_latest_probes(State(state): State<AppState>) -> ApiResult<Vec<ProbeResult>> {
    Ok(Json(ApiResponse::success(
        state.monitor.health().latest_results().await,
    )))
}

/// Run one probe (`?probe=service|network|authentication`) or all of them
pub async fn run_health_check(
    Query(query): Query<ProbeQuery>,
    State(state): State<AppState>,
) -> ApiResult<StatusSummary> {
    let kind = match query.probe.as_deref() {
        None => None,
        Some(name) => match name.parse::<ProbeKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!("Rejected health check request: {}", e);
                return Err(error_response(StatusCode::BAD_REQUEST, e.to_string()));
            }
        },
    };

    info!(
        "Manual health check requested via API ({})",
        kind.map(|k| k.as_str()).unwrap_or("all")
    );
    let snapshot = state.monitor.perform_manual_health_check(kind).await;
    Ok(Json(ApiResponse::success(convert_snapshot_to_summary(
        &snapshot,
    ))))
}
