// Common types and utilities for API handlers

use axum::{http::StatusCode, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::status::OverallStatusSnapshot;
use crate::web::StatusSummary;

// Helper type for API responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub fn error_response(status: StatusCode, message: String) -> (StatusCode, Json<ApiResponse<()>>) {
    (status, Json(ApiResponse::error(message)))
}

// Query parameters
#[derive(Deserialize)]
pub struct ProbeQuery {
    pub probe: Option<String>,
}

#[derive(Deserialize)]
pub struct ReasonQuery {
    pub reason: Option<String>,
}

pub fn convert_snapshot_to_summary(snapshot: &OverallStatusSnapshot) -> StatusSummary {
    let identity = snapshot.authentication.identity.as_ref();
    let last_error = snapshot
        .service
        .last_error
        .clone()
        .or_else(|| snapshot.authentication.last_error.clone());

    StatusSummary {
        overall: snapshot.overall,
        service: state_name(&snapshot.service.state),
        network: state_name(&snapshot.network.state),
        authentication: state_name(&snapshot.authentication.state),
        username: identity.map(|i| i.username.clone()),
        premium: identity.map(|i| i.is_premium()),
        response_time_ms: snapshot
            .service
            .response_time
            .map(|d| d.as_millis() as u64),
        connectivity_ratio: snapshot.network.connectivity_ratio,
        consecutive_errors: snapshot.consecutive_errors,
        last_error,
        last_updated: snapshot.last_updated.to_rfc3339(),
        snapshot: snapshot.clone(),
    }
}

// Serialized snake_case name of a state enum
fn state_name<T: Serialize>(state: &T) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
