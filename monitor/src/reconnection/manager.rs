//! Reconnection manager: runs one bounded, backoff-driven recovery sequence
//! at a time

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{
    select_strategy, BackoffPolicy, ReconnectionAttempt, ReconnectionContext,
    ReconnectionReason, ReconnectionResult, Strategy,
};
use crate::config::ReconnectionConfig;
use crate::constants::reconnection::{ALREADY_IN_PROGRESS, RUN_CANCELLED};
use crate::events::{StatusEvent, StatusPublisher};
use crate::health::{HealthCheckManager, ProbeKind, ProbeResult};
use crate::http::TokenProvider;
use crate::status::{derive_overall_status, OverallStatus, OverallStatusSnapshot};

/// Attempts and outcome of the most recent run
#[derive(Debug, Clone, Serialize)]
pub struct ReconnectionRun {
    pub id: Uuid,
    pub reason: ReconnectionReason,
    pub started_at: DateTime<Utc>,
    pub attempts: Vec<ReconnectionAttempt>,
    pub result: Option<ReconnectionResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconnectionStats {
    pub is_active: bool,
    pub current_attempt: u32,
    pub total_runs: u64,
    pub successful_runs: u64,
    pub last_run: Option<ReconnectionRun>,
}

enum AttemptOutcome {
    Finished(Result<(), String>),
    Cancelled,
}

/// Clears the active flag however the run ends, including when the caller
/// drops the `start` future.
struct ActiveRun<'a> {
    manager: &'a ReconnectionManager,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.manager.current_attempt.store(0, Ordering::SeqCst);
        self.manager.active.store(false, Ordering::SeqCst);
    }
}

pub struct ReconnectionManager {
    health: Arc<HealthCheckManager>,
    token_provider: Arc<dyn TokenProvider>,
    config: ReconnectionConfig,
    events: StatusPublisher,
    active: AtomicBool,
    current_attempt: AtomicU32,
    cancel: Mutex<Option<CancellationToken>>,
    last_run: RwLock<Option<ReconnectionRun>>,
    total_runs: AtomicU64,
    successful_runs: AtomicU64,
}

impl ReconnectionManager {
    pub fn new(
        health: Arc<HealthCheckManager>,
        token_provider: Arc<dyn TokenProvider>,
        config: ReconnectionConfig,
        events: StatusPublisher,
    ) -> Self {
        Self {
            health,
            token_provider,
            config,
            events,
            active: AtomicBool::new(false),
            current_attempt: AtomicU32::new(0),
            cancel: Mutex::new(None),
            last_run: RwLock::new(None),
            total_runs: AtomicU64::new(0),
            successful_runs: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run a reconnection sequence. A second call while a run is active
    /// returns a failure result immediately and leaves the active run alone.
    #[instrument(skip(self, context), fields(reason = %context.reason))]
    pub async fn start(&self, context: ReconnectionContext) -> ReconnectionResult {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Reconnection requested while another run is active");
            return ReconnectionResult::failure(
                self.current_attempt.load(Ordering::SeqCst),
                Duration::ZERO,
                ALREADY_IN_PROGRESS,
            );
        }
        let _active = ActiveRun { manager: self };

        let token = CancellationToken::new();
        *self.cancel.lock().await = Some(token.clone());
        self.total_runs.fetch_add(1, Ordering::Relaxed);

        *self.last_run.write().await = Some(ReconnectionRun {
            id: Uuid::new_v4(),
            reason: context.reason,
            started_at: Utc::now(),
            attempts: Vec::new(),
            result: None,
        });

        let started = Instant::now();
        let result = match AssertUnwindSafe(self.run(&context, &token))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!("Reconnection run panicked");
                self.events.publish_status(OverallStatus::Error);
                ReconnectionResult::failure(
                    self.current_attempt.load(Ordering::SeqCst),
                    started.elapsed(),
                    "Unexpected failure during reconnection",
                )
            }
        };

        if result.success {
            self.successful_runs.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(run) = self.last_run.write().await.as_mut() {
            run.result = Some(result.clone());
        }
        *self.cancel.lock().await = None;

        result
    }

    /// Cancel the active run, if any. The in-flight attempt is abandoned and
    /// its outstanding requests dropped.
    pub async fn stop(&self) {
        if let Some(token) = self.cancel.lock().await.as_ref() {
            info!("Cancelling active reconnection run");
            token.cancel();
        }
    }

    pub async fn stats(&self) -> ReconnectionStats {
        ReconnectionStats {
            is_active: self.is_active(),
            current_attempt: self.current_attempt.load(Ordering::SeqCst),
            total_runs: self.total_runs.load(Ordering::Relaxed),
            successful_runs: self.successful_runs.load(Ordering::Relaxed),
            last_run: self.last_run.read().await.clone(),
        }
    }

    async fn run(
        &self,
        context: &ReconnectionContext,
        cancel: &CancellationToken,
    ) -> ReconnectionResult {
        let max_attempts = context
            .max_attempts
            .unwrap_or(self.config.max_attempts)
            .max(1);
        let mut backoff = BackoffPolicy::from_config(&self.config);
        if let Some(base) = context.base_delay {
            backoff.base_delay = base;
        }
        if let Some(max) = context.max_delay {
            backoff.max_delay = max;
        }

        info!(
            "Starting reconnection ({}), up to {} attempts",
            context.reason, max_attempts
        );
        self.events.publish_status(OverallStatus::Reconnecting);
        self.events.publish(StatusEvent::ReconnectionStarted {
            reason: context.reason,
            max_attempts,
        });

        let started = Instant::now();
        let mut last_error: Option<String> = None;
        let mut attempts_made = 0;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return self.cancelled(attempts_made, started).await;
            }

            self.current_attempt.store(attempt, Ordering::SeqCst);
            let strategy = select_strategy(context.reason, attempt);
            let delay = if attempt == 1 {
                Duration::ZERO
            } else {
                backoff.with_jitter(backoff.delay_for(attempt))
            };

            if !delay.is_zero() {
                debug!("Waiting {}ms before attempt {}", delay.as_millis(), attempt);
                tokio::select! {
                    _ = cancel.cancelled() => return self.cancelled(attempts_made, started).await,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let timestamp = Utc::now();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => AttemptOutcome::Cancelled,
                outcome = self.execute_strategy(strategy) => AttemptOutcome::Finished(outcome),
            };
            let outcome = match outcome {
                AttemptOutcome::Finished(outcome) => outcome,
                AttemptOutcome::Cancelled => return self.cancelled(attempts_made, started).await,
            };
            attempts_made = attempt;

            let record = ReconnectionAttempt {
                attempt,
                strategy,
                delay,
                timestamp,
                success: outcome.is_ok(),
                error: outcome.as_ref().err().cloned(),
            };
            self.record_attempt(record).await;

            match outcome {
                Ok(()) => {
                    let snapshot = self.fresh_snapshot(strategy).await;
                    info!(
                        "Reconnection succeeded on attempt {} using {}",
                        attempt, strategy
                    );
                    self.events.publish_status(OverallStatus::Connected);
                    self.events.publish(StatusEvent::ReconnectionSucceeded {
                        attempts: attempt,
                        snapshot: Some(snapshot.clone()),
                    });
                    return ReconnectionResult {
                        success: true,
                        attempts: attempt,
                        duration: started.elapsed(),
                        error: None,
                        strategy: Some(strategy),
                        snapshot: Some(snapshot),
                    };
                }
                Err(e) => {
                    warn!(
                        "Reconnection attempt {}/{} ({}) failed: {}",
                        attempt, max_attempts, strategy, e
                    );
                    last_error = Some(e);
                }
            }
        }

        error!("Reconnection exhausted after {} attempts", attempts_made);
        self.events.publish_status(OverallStatus::Error);
        self.events.publish(StatusEvent::ReconnectionFailed {
            attempts: attempts_made,
            error: last_error.clone(),
        });

        ReconnectionResult {
            success: false,
            attempts: attempts_made,
            duration: started.elapsed(),
            error: last_error,
            strategy: Some(select_strategy(context.reason, attempts_made.max(1))),
            snapshot: None,
        }
    }

    /// Ends a cancelled run by publishing the status derived from the stored
    /// results, so `reconnecting` is never the last word.
    async fn cancelled(&self, attempts: u32, started: Instant) -> ReconnectionResult {
        info!("Reconnection cancelled after {} attempts", attempts);
        let statuses = self.health.derived_statuses().await;
        self.events.publish_status(derive_overall_status(
            &statuses.authentication,
            &statuses.service,
            &statuses.network,
        ));
        ReconnectionResult::failure(attempts, started.elapsed(), RUN_CANCELLED)
    }

    async fn record_attempt(&self, attempt: ReconnectionAttempt) {
        if let Some(run) = self.last_run.write().await.as_mut() {
            run.attempts.push(attempt);
        }
    }

    async fn execute_strategy(&self, strategy: Strategy) -> Result<(), String> {
        match strategy {
            Strategy::TokenRefresh => match self.token_provider.refresh_token().await {
                Ok(Some(_)) => {
                    let (auth, service) = tokio::join!(
                        self.health.perform_check(ProbeKind::Authentication),
                        self.health.perform_check(ProbeKind::Service),
                    );
                    require(&auth).and(require(&service))
                }
                Ok(None) => Err("Token refresh returned no credential".to_string()),
                Err(e) => Err(format!("Token refresh failed: {}", e)),
            },
            Strategy::FullReauth => {
                let auth = self.health.perform_check(ProbeKind::Authentication).await;
                require(&auth)
            }
            Strategy::Retry => {
                let (network, service) = tokio::join!(
                    self.health.perform_check(ProbeKind::Network),
                    self.health.perform_check(ProbeKind::Service),
                );
                require(&network).and(require(&service))
            }
            Strategy::NetworkWait => {
                let network = self.health.perform_check(ProbeKind::Network).await;
                require(&network)
            }
        }
    }

    /// Re-run the probes the winning strategy did not verify, then derive.
    /// The run's success is judged by the strategy's own verification, so
    /// the snapshot may still show a sub-status the strategy did not cover.
    async fn fresh_snapshot(&self, strategy: Strategy) -> OverallStatusSnapshot {
        let unverified: Vec<ProbeKind> = ProbeKind::ALL
            .iter()
            .copied()
            .filter(|kind| !verified_by(strategy).contains(kind))
            .collect();
        join_all(unverified.into_iter().map(|kind| self.health.perform_check(kind))).await;

        let statuses = self.health.derived_statuses().await;
        OverallStatusSnapshot::new(
            statuses.authentication,
            statuses.service,
            statuses.network,
            0,
        )
    }
}

fn verified_by(strategy: Strategy) -> &'static [ProbeKind] {
    match strategy {
        Strategy::TokenRefresh => &[ProbeKind::Authentication, ProbeKind::Service],
        Strategy::FullReauth => &[ProbeKind::Authentication],
        Strategy::Retry => &[ProbeKind::Network, ProbeKind::Service],
        Strategy::NetworkWait => &[ProbeKind::Network],
    }
}

fn require(result: &ProbeResult) -> Result<(), String> {
    if result.success {
        Ok(())
    } else {
        Err(result
            .error
            .clone()
            .unwrap_or_else(|| format!("{} probe failed", result.probe)))
    }
}
