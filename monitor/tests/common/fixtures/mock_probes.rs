//! Scripted probes for driving the health, reconnection and monitor layers
//! without any network access

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use connection_monitor::config::ReconnectionConfig;
use connection_monitor::health::types::{NetworkDetails, TargetResult};
use connection_monitor::health::{
    HealthCheckManager, HealthCheckSettings, Probe, ProbeDetails, ProbeKind, ProbeOutcome,
    ProbeSet, StatusThresholds,
};
use connection_monitor::http::{Identity, TokenProvider};
use connection_monitor::{ConnectionMonitor, MonitorSettings, ReconnectionManager, StatusPublisher};

/// One scripted probe execution
#[derive(Debug, Clone)]
pub enum Step {
    Succeed,
    Fail(Option<u16>, &'static str),
    Error(&'static str),
    Panic(&'static str),
    /// Succeed after sleeping
    Slow(Duration),
}

/// Probe that plays back a script, then repeats its fallback step forever
pub struct ScriptedProbe {
    kind: ProbeKind,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(kind: ProbeKind, script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            kind,
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn always(kind: ProbeKind, step: Step) -> Arc<Self> {
        Self::new(kind, Vec::new(), step)
    }

    pub fn healthy(kind: ProbeKind) -> Arc<Self> {
        Self::always(kind, Step::Succeed)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Runs that reached the end of their step
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn success(&self) -> ProbeOutcome {
        match self.kind {
            ProbeKind::Network => ProbeOutcome::success(Some(ProbeDetails::Network(
                NetworkDetails::from_targets(vec![TargetResult {
                    url: "https://www.cloudflare.com".to_string(),
                    reachable: true,
                    latency: Duration::from_millis(40),
                    status_code: Some(200),
                    error: None,
                }]),
            ))),
            _ => ProbeOutcome::success(Some(ProbeDetails::Identity(test_identity()))),
        }
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self) -> Result<ProbeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match self.next_step() {
            Step::Succeed => Ok(self.success()),
            Step::Fail(code, error) => Ok(ProbeOutcome::failure(code, error)),
            Step::Error(message) => Err(anyhow!(message)),
            Step::Panic(message) => panic!("{}", message),
            Step::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.success())
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}

pub fn test_identity() -> Identity {
    Identity {
        id: 42,
        username: "streamer".to_string(),
        email: Some("streamer@example.com".to_string()),
        premium: 2_592_000,
        expiration: Some("2030-01-01T00:00:00.000Z".to_string()),
        user_type: Some("premium".to_string()),
    }
}

/// Token provider with a fixed token and a scripted refresh result
pub struct MockTokenProvider {
    token: Option<String>,
    refreshed: Option<String>,
    refresh_calls: AtomicUsize,
}

impl MockTokenProvider {
    pub fn new(token: Option<&str>, refreshed: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            token: token.map(str::to_string),
            refreshed: refreshed.map(str::to_string),
            refresh_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_token() -> Arc<Self> {
        Self::new(Some("token-1"), Some("token-2"))
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.refreshed.clone())
    }
}

/// Reconnection settings with millisecond delays and no jitter
pub fn fast_reconnection(max_attempts: u32) -> ReconnectionConfig {
    ReconnectionConfig {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

/// Fully wired components over scripted probes
pub struct TestHarness {
    pub service: Arc<ScriptedProbe>,
    pub network: Arc<ScriptedProbe>,
    pub authentication: Arc<ScriptedProbe>,
    pub tokens: Arc<MockTokenProvider>,
    pub health: Arc<HealthCheckManager>,
    pub reconnection: Arc<ReconnectionManager>,
    pub monitor: ConnectionMonitor,
    pub events: StatusPublisher,
}

impl TestHarness {
    pub fn new(
        service: Arc<ScriptedProbe>,
        network: Arc<ScriptedProbe>,
        authentication: Arc<ScriptedProbe>,
        reconnection: ReconnectionConfig,
    ) -> Self {
        Self::with_tokens(
            service,
            network,
            authentication,
            reconnection,
            MockTokenProvider::with_token(),
        )
    }

    pub fn with_tokens(
        service: Arc<ScriptedProbe>,
        network: Arc<ScriptedProbe>,
        authentication: Arc<ScriptedProbe>,
        reconnection: ReconnectionConfig,
        tokens: Arc<MockTokenProvider>,
    ) -> Self {
        let probes = ProbeSet {
            service: service.clone(),
            network: network.clone(),
            authentication: authentication.clone(),
        };
        let health = Arc::new(HealthCheckManager::new(
            probes,
            HealthCheckSettings {
                enabled: true,
                service_interval: Duration::from_secs(30),
                network_interval: Duration::from_secs(60),
                thresholds: StatusThresholds::default(),
            },
        ));
        let events = StatusPublisher::new();
        let reconnection = Arc::new(ReconnectionManager::new(
            health.clone(),
            tokens.clone(),
            reconnection,
            events.clone(),
        ));
        let monitor = ConnectionMonitor::new(
            health.clone(),
            reconnection.clone(),
            events.clone(),
            MonitorSettings {
                enabled: true,
                auto_reconnect: true,
                evaluation_interval: Duration::from_secs(60),
            },
        );

        Self {
            service,
            network,
            authentication,
            tokens,
            health,
            reconnection,
            monitor,
            events,
        }
    }

    /// All probes healthy
    pub fn healthy(reconnection: ReconnectionConfig) -> Self {
        Self::new(
            ScriptedProbe::healthy(ProbeKind::Service),
            ScriptedProbe::healthy(ProbeKind::Network),
            ScriptedProbe::healthy(ProbeKind::Authentication),
            reconnection,
        )
    }
}
