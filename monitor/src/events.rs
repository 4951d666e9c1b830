//! Status events published by the monitor and the reconnection manager
//!
//! Collaborators (alerting, the status API, a UI bridge) subscribe to a
//! [`StatusPublisher`] instead of handing callbacks down through constructors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::constants::defaults;
use crate::reconnection::ReconnectionReason;
use crate::status::{ChangeKind, OverallStatus, OverallStatusSnapshot};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A full evaluation finished
    Snapshot {
        snapshot: OverallStatusSnapshot,
        change: ChangeKind,
    },
    /// Partial update: only the overall status changed
    Status {
        status: OverallStatus,
        timestamp: DateTime<Utc>,
    },
    ReconnectionStarted {
        reason: ReconnectionReason,
        max_attempts: u32,
    },
    ReconnectionSucceeded {
        attempts: u32,
        snapshot: Option<OverallStatusSnapshot>,
    },
    ReconnectionFailed {
        attempts: u32,
        error: Option<String>,
    },
}

#[derive(Clone)]
pub struct StatusPublisher {
    sender: broadcast::Sender<StatusEvent>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self::with_capacity(defaults::EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: StatusEvent) {
        // No subscribers is fine
        if self.sender.send(event).is_err() {
            trace!("Status event dropped: no subscribers");
        }
    }

    pub fn publish_status(&self, status: OverallStatus) {
        self.publish(StatusEvent::Status {
            status,
            timestamp: Utc::now(),
        });
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}
