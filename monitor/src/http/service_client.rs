// File: monitor/src/http/service_client.rs
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::constants::http;
use crate::errors::HttpError;

/// Account identity returned by the service's identity endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Remaining premium time in seconds
    #[serde(default)]
    pub premium: i64,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(rename = "type", default)]
    pub user_type: Option<String>,
}

impl Identity {
    pub fn is_premium(&self) -> bool {
        self.premium > 0 || self.user_type.as_deref() == Some("premium")
    }
}

/// Failure of a call against the remote service
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// 401: token rejected
    Unauthorized { message: String },
    /// 429: too many requests
    RateLimited { message: String },
    /// 5xx: service side failure
    Unavailable { status: u16, message: String },
    /// Any other non-2xx status
    Status { status: u16, message: String },
    /// No response within the configured timeout
    Timeout { after: Duration },
    /// Transport level failure (DNS, refused, reset)
    Connection { reason: String },
    /// 2xx with a body that is not the expected JSON
    InvalidBody { reason: String },
}

impl ServiceError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Unauthorized { .. } => Some(401),
            ServiceError::RateLimited { .. } => Some(429),
            ServiceError::Unavailable { status, .. } | ServiceError::Status { status, .. } => {
                Some(*status)
            }
            ServiceError::Timeout { .. }
            | ServiceError::Connection { .. }
            | ServiceError::InvalidBody { .. } => None,
        }
    }

    fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => ServiceError::Unauthorized { message },
            429 => ServiceError::RateLimited { message },
            code if status.is_server_error() => ServiceError::Unavailable {
                status: code,
                message,
            },
            code => ServiceError::Status {
                status: code,
                message,
            },
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Unauthorized { message } => write!(f, "HTTP 401: {}", message),
            ServiceError::RateLimited { message } => write!(f, "HTTP 429: {}", message),
            ServiceError::Unavailable { status, message }
            | ServiceError::Status { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            ServiceError::Timeout { after } => {
                write!(f, "Request timed out after {}ms", after.as_millis())
            }
            ServiceError::Connection { reason } => write!(f, "Connection failed: {}", reason),
            ServiceError::InvalidBody { reason } => {
                write!(f, "Failed to parse response body: {}", reason)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// Error body shape used by the debrid API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Authenticated client for the remote service
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    config: ServiceConfig,
}

impl ServiceClient {
    pub fn new(config: ServiceConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(http::CONNECT_TIMEOUT)
            .user_agent(http::USER_AGENT)
            .build()
            .map_err(|e| HttpError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Underlying HTTP client, shared with the network probe
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Call the identity endpoint with the given bearer token
    pub async fn fetch_identity(&self, token: &str) -> Result<Identity, ServiceError> {
        let url = self.config.identity_url();
        let limit = self.config.timeout();

        debug!("Fetching identity from {}", url);

        let response = timeout(limit, self.client.get(&url).bearer_auth(token).send())
            .await
            .map_err(|_| ServiceError::Timeout { after: limit })?
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout { after: limit }
                } else {
                    ServiceError::Connection {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status, error_message(status, &body)));
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| ServiceError::InvalidBody {
                reason: e.to_string(),
            })
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error_code {
            Some(code) => format!("{} (code {})", parsed.error, code),
            None => parsed.error,
        },
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string(),
    }
}
