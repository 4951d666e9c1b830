// File: monitor/src/services/alert_service.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::constants::alerts;
use crate::errors::HttpError;
use crate::events::StatusEvent;
use crate::status::OverallStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    ConnectionStatus,
    Reconnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
    Recovery,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub timestamp: DateTime<Utc>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub service: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
struct AlertState {
    last_overall: Option<OverallStatus>,
    has_sent_alert: bool,
}

/// Forwards connection status transitions to a webhook. With an empty URL
/// alerts are only logged.
#[derive(Clone)]
pub struct AlertService {
    webhook_url: String,
    service: String,
    client: Client,
    state: Arc<Mutex<AlertState>>,
}

impl AlertService {
    pub fn new(webhook_url: String, service: String) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(alerts::WEBHOOK_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| HttpError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            webhook_url,
            service,
            client,
            state: Arc::new(Mutex::new(AlertState::default())),
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    /// Consume status events until the channel closes
    pub fn spawn_listener(self, mut receiver: broadcast::Receiver<StatusEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.handle_event(&event).await {
                            warn!("Failed to handle status event for alerting: {}", e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Alert listener lagged, {} status events skipped", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Status event channel closed, alert listener exiting");
                        break;
                    }
                }
            }
        })
    }

    pub async fn handle_event(&self, event: &StatusEvent) -> Result<()> {
        if let Some(payload) = self.alert_for(event).await {
            self.send_webhook(&payload).await?;
        }
        Ok(())
    }

    /// Decide whether an event warrants an alert, updating the transition state
    pub async fn alert_for(&self, event: &StatusEvent) -> Option<AlertPayload> {
        match event {
            StatusEvent::Snapshot { snapshot, .. } => {
                let details = serde_json::to_value(snapshot).ok();
                self.transition(snapshot.overall, details).await
            }
            StatusEvent::ReconnectionSucceeded {
                snapshot: Some(snapshot),
                ..
            } => {
                let details = serde_json::to_value(snapshot).ok();
                self.transition(snapshot.overall, details).await
            }
            StatusEvent::ReconnectionStarted {
                reason,
                max_attempts,
            } => Some(self.payload(
                AlertType::Reconnection,
                AlertSeverity::Info,
                format!(
                    "Reconnection started ({}), up to {} attempts",
                    reason, max_attempts
                ),
                None,
            )),
            StatusEvent::ReconnectionFailed { attempts, error } => {
                self.state.lock().await.has_sent_alert = true;
                Some(self.payload(
                    AlertType::Reconnection,
                    AlertSeverity::Critical,
                    format!(
                        "Reconnection failed after {} attempts: {}",
                        attempts,
                        error.as_deref().unwrap_or("unknown error")
                    ),
                    None,
                ))
            }
            _ => None,
        }
    }

    async fn transition(
        &self,
        overall: OverallStatus,
        details: Option<serde_json::Value>,
    ) -> Option<AlertPayload> {
        let mut state = self.state.lock().await;
        let previous = state.last_overall.replace(overall);
        if previous == Some(overall) {
            return None;
        }

        let (severity, message) = match overall {
            OverallStatus::Disconnected => (AlertSeverity::Critical, "Network connectivity lost"),
            OverallStatus::Error => (AlertSeverity::Critical, "Service connection failing"),
            OverallStatus::Limited => (AlertSeverity::Warning, "Service connection limited"),
            OverallStatus::Connected => {
                if !state.has_sent_alert {
                    return None;
                }
                state.has_sent_alert = false;
                (AlertSeverity::Recovery, "Service connection recovered")
            }
            OverallStatus::Connecting | OverallStatus::Reconnecting => return None,
        };
        if severity != AlertSeverity::Recovery {
            state.has_sent_alert = true;
        }
        drop(state);

        Some(self.payload(
            AlertType::ConnectionStatus,
            severity,
            message.to_string(),
            details,
        ))
    }

    fn payload(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
        details: Option<serde_json::Value>,
    ) -> AlertPayload {
        AlertPayload {
            timestamp: Utc::now(),
            alert_type,
            severity,
            service: self.service.clone(),
            message,
            details,
        }
    }

    async fn send_webhook(&self, payload: &AlertPayload) -> Result<()> {
        if self.webhook_url.is_empty() {
            info!(
                "Alert ({:?}, {:?}): {}",
                payload.alert_type, payload.severity, payload.message
            );
            return Ok(());
        }

        match timeout(
            Duration::from_secs(alerts::WEBHOOK_TIMEOUT_SECONDS),
            self.client.post(&self.webhook_url).json(payload).send(),
        )
        .await
        {
            Ok(Ok(response)) => {
                if response.status().is_success() {
                    info!(
                        "Alert sent successfully: {:?} {:?}",
                        payload.alert_type, payload.severity
                    );
                } else {
                    warn!("Alert webhook returned status: {}", response.status());
                }
            }
            Ok(Err(e)) => {
                warn!("Failed to send alert: {}", e);
            }
            Err(_) => {
                warn!("Alert webhook timeout for {}", self.webhook_url);
            }
        }

        Ok(())
    }
}
