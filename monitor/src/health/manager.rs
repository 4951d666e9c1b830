//! Health check manager: runs probes, keeps the latest result per probe and
//! derives the three independent statuses from them

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, error, info, warn};

use super::probes::{Probe, ProbeSet};
use super::status::{
    derive_auth_status, derive_network_status, derive_service_status, StatusThresholds,
};
use super::types::{AuthenticationStatus, NetworkStatus, ProbeKind, ProbeResult, ServiceStatus};
use crate::config::MonitoringConfig;
use crate::errors::ProbeError;
use crate::scheduler::PeriodicTask;

type ResultMap = Arc<RwLock<HashMap<ProbeKind, ProbeResult>>>;

#[derive(Debug, Clone)]
pub struct HealthCheckSettings {
    pub enabled: bool,
    pub service_interval: Duration,
    pub network_interval: Duration,
    pub thresholds: StatusThresholds,
}

impl From<&MonitoringConfig> for HealthCheckSettings {
    fn from(config: &MonitoringConfig) -> Self {
        Self {
            enabled: config.enabled,
            service_interval: config.service_interval(),
            network_interval: config.network_interval(),
            thresholds: StatusThresholds::from(config),
        }
    }
}

/// The three derived statuses, computed from one consistent read of the
/// result map
#[derive(Debug, Clone)]
pub struct DerivedStatuses {
    pub authentication: AuthenticationStatus,
    pub service: ServiceStatus,
    pub network: NetworkStatus,
}

pub struct HealthCheckManager {
    probes: ProbeSet,
    settings: HealthCheckSettings,
    results: ResultMap,
    tasks: Mutex<Vec<PeriodicTask>>,
    checks_performed: Arc<AtomicU64>,
}

impl HealthCheckManager {
    pub fn new(probes: ProbeSet, settings: HealthCheckSettings) -> Self {
        Self {
            probes,
            settings,
            results: Arc::new(RwLock::new(HashMap::with_capacity(3))),
            tasks: Mutex::new(Vec::new()),
            checks_performed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Execute one probe and store its result, replacing the previous one
    pub async fn perform_check(&self, kind: ProbeKind) -> ProbeResult {
        run_and_store(self.probes.get(kind), kind, &self.results, &self.checks_performed).await
    }

    /// Like [`perform_check`](Self::perform_check) but addressed by name
    pub async fn perform_check_named(&self, name: &str) -> Result<ProbeResult, ProbeError> {
        let kind: ProbeKind = name.parse()?;
        Ok(self.perform_check(kind).await)
    }

    /// Run all three probes concurrently. Individual failures are captured in
    /// their results and never abort the batch.
    pub async fn perform_all(&self) -> Vec<ProbeResult> {
        let (service, network, authentication) = tokio::join!(
            self.perform_check(ProbeKind::Service),
            self.perform_check(ProbeKind::Network),
            self.perform_check(ProbeKind::Authentication),
        );

        let failed = [&service, &network, &authentication]
            .iter()
            .filter(|r| !r.success)
            .count();
        if failed > 0 {
            debug!("Full probe round finished with {} failing probe(s)", failed);
        }

        vec![service, network, authentication]
    }

    /// Start the periodic service and network probes. No-op when already
    /// running or when monitoring is disabled.
    pub async fn start_monitoring(&self) {
        if !self.settings.enabled {
            info!("Health monitoring disabled by configuration");
            return;
        }

        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            debug!("Health monitoring already running");
            return;
        }

        for (kind, period) in [
            (ProbeKind::Service, self.settings.service_interval),
            (ProbeKind::Network, self.settings.network_interval),
        ] {
            let probe = self.probes.get(kind);
            let results = self.results.clone();
            let counter = self.checks_performed.clone();

            tasks.push(PeriodicTask::spawn(task_name(kind), period, move || {
                let probe = probe.clone();
                let results = results.clone();
                let counter = counter.clone();
                async move {
                    run_and_store(probe, kind, &results, &counter).await;
                }
            }));
        }

        info!(
            "Health monitoring started (service every {}s, network every {}s)",
            self.settings.service_interval.as_secs(),
            self.settings.network_interval.as_secs()
        );
    }

    /// Cancel all periodic probes. Idempotent.
    pub async fn stop_monitoring(&self) {
        let mut tasks = self.tasks.lock().await;
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            debug!("Cancelling periodic task '{}'", task.name());
            task.cancel();
        }
        info!("Health monitoring stopped");
    }

    pub async fn is_monitoring(&self) -> bool {
        !self.tasks.lock().await.is_empty()
    }

    pub fn checks_performed(&self) -> u64 {
        self.checks_performed.load(Ordering::Relaxed)
    }

    pub async fn latest(&self, kind: ProbeKind) -> Option<ProbeResult> {
        self.results.read().await.get(&kind).cloned()
    }

    pub async fn latest_results(&self) -> Vec<ProbeResult> {
        let results = self.results.read().await;
        ProbeKind::ALL
            .iter()
            .filter_map(|kind| results.get(kind).cloned())
            .collect()
    }

    pub async fn service_status(&self) -> ServiceStatus {
        let results = self.results.read().await;
        derive_service_status(
            results.get(&ProbeKind::Service),
            results.get(&ProbeKind::Network),
            &self.settings.thresholds,
        )
    }

    pub async fn network_status(&self) -> NetworkStatus {
        let results = self.results.read().await;
        derive_network_status(results.get(&ProbeKind::Network), &self.settings.thresholds)
    }

    pub async fn auth_status(&self) -> AuthenticationStatus {
        let results = self.results.read().await;
        derive_auth_status(results.get(&ProbeKind::Authentication))
    }

    pub async fn derived_statuses(&self) -> DerivedStatuses {
        let results = self.results.read().await;
        DerivedStatuses {
            authentication: derive_auth_status(results.get(&ProbeKind::Authentication)),
            service: derive_service_status(
                results.get(&ProbeKind::Service),
                results.get(&ProbeKind::Network),
                &self.settings.thresholds,
            ),
            network: derive_network_status(
                results.get(&ProbeKind::Network),
                &self.settings.thresholds,
            ),
        }
    }
}

fn task_name(kind: ProbeKind) -> &'static str {
    match kind {
        ProbeKind::Service => "service-probe",
        ProbeKind::Network => "network-probe",
        ProbeKind::Authentication => "authentication-probe",
    }
}

async fn run_and_store(
    probe: Arc<dyn Probe>,
    kind: ProbeKind,
    results: &ResultMap,
    counter: &AtomicU64,
) -> ProbeResult {
    let result = execute_probe(probe, kind).await;
    counter.fetch_add(1, Ordering::Relaxed);
    results.write().await.insert(kind, result.clone());
    result
}

/// Run a probe on its own task so that errors and panics both end up as a
/// failed result. Dropping the returned future aborts the task.
async fn execute_probe(probe: Arc<dyn Probe>, kind: ProbeKind) -> ProbeResult {
    let timestamp = Utc::now();
    let started = Instant::now();

    let outcome = AbortOnDropHandle::new(tokio::spawn(async move { probe.run().await })).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(outcome)) => {
            if !outcome.success {
                warn!(
                    "{} probe failed: {}",
                    kind,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            ProbeResult::from_outcome(kind, outcome, elapsed, timestamp)
        }
        Ok(Err(e)) => {
            warn!("{} probe error: {}", kind, e);
            ProbeResult::failed(kind, e.to_string(), elapsed, timestamp)
        }
        Err(e) => {
            error!("{} probe task panicked: {}", kind, e);
            ProbeResult::failed(kind, panic_message(e), elapsed, timestamp)
        }
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if err.is_cancelled() {
        return "Probe task cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Probe task panicked".to_string()
    }
}
