//! Connection monitor: owns the current snapshot, the periodic re-evaluation
//! loop and the decision to reconnect

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::reconnection::{ALREADY_IN_PROGRESS, RUN_CANCELLED};
use crate::events::{StatusEvent, StatusPublisher};
use crate::health::{AuthState, HealthCheckManager, NetworkState, ProbeKind, ServiceState};
use crate::reconnection::{
    ReconnectionContext, ReconnectionManager, ReconnectionReason, ReconnectionResult,
    ReconnectionStats,
};
use crate::scheduler::PeriodicTask;
use crate::status::{classify_change, ChangeKind, OverallStatus, OverallStatusSnapshot};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub auto_reconnect: bool,
    pub evaluation_interval: Duration,
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        Self {
            enabled: config.monitoring.enabled,
            auto_reconnect: config.monitoring.auto_reconnect,
            evaluation_interval: config.monitoring.network_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStats {
    pub is_monitoring: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub evaluations: u64,
    pub checks_performed: u64,
    pub reconnections_triggered: u64,
    pub consecutive_errors: u32,
    pub current_status: Option<OverallStatus>,
    pub reconnection: ReconnectionStats,
}

/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct ConnectionMonitor {
    health: Arc<HealthCheckManager>,
    reconnection: Arc<ReconnectionManager>,
    events: StatusPublisher,
    settings: MonitorSettings,
    current: Arc<RwLock<Option<OverallStatusSnapshot>>>,
    evaluator: Arc<Mutex<Option<PeriodicTask>>>,
    started_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    consecutive_errors: Arc<AtomicU32>,
    evaluations: Arc<AtomicU64>,
    reconnections_triggered: Arc<AtomicU64>,
}

impl ConnectionMonitor {
    pub fn new(
        health: Arc<HealthCheckManager>,
        reconnection: Arc<ReconnectionManager>,
        events: StatusPublisher,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            health,
            reconnection,
            events,
            settings,
            current: Arc::new(RwLock::new(None)),
            evaluator: Arc::new(Mutex::new(None)),
            started_at: Arc::new(RwLock::new(None)),
            consecutive_errors: Arc::new(AtomicU32::new(0)),
            evaluations: Arc::new(AtomicU64::new(0)),
            reconnections_triggered: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn health(&self) -> &Arc<HealthCheckManager> {
        &self.health
    }

    /// Run one full probe round, store the initial snapshot and start the
    /// periodic probes and re-evaluation loop. No-op when already running or
    /// when monitoring is disabled.
    pub async fn start_monitoring(&self) {
        if !self.settings.enabled {
            info!("Connection monitoring disabled by configuration");
            return;
        }

        let mut evaluator = self.evaluator.lock().await;
        if evaluator.is_some() {
            debug!("Connection monitoring already running");
            return;
        }

        info!("Starting connection monitoring");
        self.health.perform_all().await;
        let snapshot = self.store_snapshot().await;
        info!("Initial connection status: {}", snapshot.overall);

        self.health.start_monitoring().await;

        let monitor = self.clone();
        *evaluator = Some(PeriodicTask::spawn(
            "status-evaluation",
            self.settings.evaluation_interval,
            move || {
                let monitor = monitor.clone();
                async move {
                    monitor.evaluate().await;
                }
            },
        ));
        *self.started_at.write().await = Some(Utc::now());
    }

    /// Cancel the re-evaluation loop, the periodic probes and any active
    /// reconnection run. Idempotent.
    pub async fn stop_monitoring(&self) {
        let task = self.evaluator.lock().await.take();
        if let Some(task) = task {
            task.cancel();
            info!("Connection monitoring stopped");
        }
        self.health.stop_monitoring().await;
        if self.reconnection.is_active() {
            self.reconnection.stop().await;
        }
        *self.started_at.write().await = None;
    }

    pub async fn is_monitoring(&self) -> bool {
        self.evaluator.lock().await.is_some()
    }

    /// One re-evaluation tick: derive from the stored results, store and
    /// publish the snapshot, then apply the reconnection policy.
    pub async fn evaluate(&self) -> OverallStatusSnapshot {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let snapshot = self.store_snapshot().await;

        if self.settings.auto_reconnect
            && should_reconnect(&snapshot)
            && !self.reconnection.is_active()
        {
            let reason = reconnection_reason(&snapshot);
            warn!(
                "Connection is {} ({} consecutive), starting reconnection: {}",
                snapshot.overall, snapshot.consecutive_errors, reason
            );
            let context = ReconnectionContext::new(reason).with_previous(Some(snapshot.clone()));
            let monitor = self.clone();
            tokio::spawn(async move {
                monitor.run_reconnection(context).await;
            });
        }

        snapshot
    }

    /// Run one or all probes now and store the resulting snapshot. Never
    /// starts a reconnection.
    pub async fn perform_manual_health_check(
        &self,
        kind: Option<ProbeKind>,
    ) -> OverallStatusSnapshot {
        match kind {
            Some(kind) => {
                info!("Manual {} health check requested", kind);
                self.health.perform_check(kind).await;
            }
            None => {
                info!("Manual full health check requested");
                self.health.perform_all().await;
            }
        }
        self.store_snapshot().await
    }

    /// Start a reconnection now, bypassing the automatic policy. Returns the
    /// "already in progress" result when a run is active. The run lives on its
    /// own task, so dropping the returned future does not abandon it.
    pub async fn trigger_manual_reconnection(
        &self,
        reason: ReconnectionReason,
    ) -> ReconnectionResult {
        info!("Manual reconnection requested: {}", reason);
        let previous = self.current_status().await;
        let context = ReconnectionContext::new(reason).with_previous(previous);

        let monitor = self.clone();
        match tokio::spawn(async move { monitor.run_reconnection(context).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!("Manual reconnection task failed: {}", e);
                ReconnectionResult::failure(0, Duration::ZERO, "Reconnection task failed")
            }
        }
    }

    pub async fn current_status(&self) -> Option<OverallStatusSnapshot> {
        self.current.read().await.clone()
    }

    pub async fn monitoring_stats(&self) -> MonitoringStats {
        let current_status = self.current.read().await.as_ref().map(|s| s.overall);
        MonitoringStats {
            is_monitoring: self.is_monitoring().await,
            started_at: *self.started_at.read().await,
            evaluations: self.evaluations.load(Ordering::Relaxed),
            checks_performed: self.health.checks_performed(),
            reconnections_triggered: self.reconnections_triggered.load(Ordering::Relaxed),
            consecutive_errors: self.consecutive_errors.load(Ordering::Relaxed),
            current_status,
            reconnection: self.reconnection.stats().await,
        }
    }

    async fn run_reconnection(&self, context: ReconnectionContext) -> ReconnectionResult {
        self.reconnections_triggered.fetch_add(1, Ordering::Relaxed);
        if !self.reconnection.is_active() {
            self.mark_overall(OverallStatus::Reconnecting).await;
        }

        let result = self.reconnection.start(context).await;

        if result.success {
            if let Some(snapshot) = &result.snapshot {
                self.consecutive_errors.store(0, Ordering::Relaxed);
                let mut snapshot = snapshot.clone();
                snapshot.consecutive_errors = 0;
                *self.current.write().await = Some(snapshot);
            }
        } else if result.error.as_deref() == Some(RUN_CANCELLED) {
            self.store_snapshot().await;
        } else if result.error.as_deref() != Some(ALREADY_IN_PROGRESS) {
            // A rejected concurrent request leaves the active run's status alone
            error!(
                "Reconnection failed after {} attempts: {}",
                result.attempts,
                result.error.as_deref().unwrap_or("unknown error")
            );
            self.mark_overall(OverallStatus::Error).await;
        }

        result
    }

    async fn mark_overall(&self, status: OverallStatus) {
        if let Some(snapshot) = self.current.write().await.as_mut() {
            snapshot.overall = status;
            snapshot.last_updated = Utc::now();
        }
    }

    /// Derive, count, classify, store and publish a fresh snapshot
    async fn store_snapshot(&self) -> OverallStatusSnapshot {
        let statuses = self.health.derived_statuses().await;
        let mut snapshot = OverallStatusSnapshot::new(
            statuses.authentication,
            statuses.service,
            statuses.network,
            0,
        );

        let consecutive = if snapshot.is_failing() {
            self.consecutive_errors.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.consecutive_errors.store(0, Ordering::Relaxed);
            0
        };
        snapshot.consecutive_errors = consecutive;
        if self.reconnection.is_active() {
            snapshot.overall = OverallStatus::Reconnecting;
        }

        let change = {
            let mut current = self.current.write().await;
            let change = classify_change(current.as_ref(), &snapshot);
            *current = Some(snapshot.clone());
            change
        };

        match change {
            ChangeKind::Critical => warn!("Connection status dropped to {}", snapshot.overall),
            ChangeKind::Degradation => debug!("Connection status degraded: {}", snapshot.overall),
            _ => debug!("Connection status: {} ({:?})", snapshot.overall, change),
        }

        self.events.publish(StatusEvent::Snapshot {
            snapshot: snapshot.clone(),
            change,
        });
        snapshot
    }
}

/// Overall error or disconnected, or limited with the service unavailable
pub fn should_reconnect(snapshot: &OverallStatusSnapshot) -> bool {
    match snapshot.overall {
        OverallStatus::Error | OverallStatus::Disconnected => true,
        OverallStatus::Limited => snapshot.service.state == ServiceState::Unavailable,
        _ => false,
    }
}

pub fn reconnection_reason(snapshot: &OverallStatusSnapshot) -> ReconnectionReason {
    if matches!(
        snapshot.authentication.state,
        AuthState::Error | AuthState::Unauthenticated | AuthState::TokenExpired
    ) {
        ReconnectionReason::Authentication
    } else if snapshot.network.state == NetworkState::Disconnected {
        ReconnectionReason::NetworkDisconnect
    } else {
        ReconnectionReason::ServiceUnavailable
    }
}
