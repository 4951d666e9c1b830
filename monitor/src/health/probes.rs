//! Probe implementations: service reachability, network connectivity and
//! authentication validity
//!
//! Probes are stateless and never retry. They report failures as a
//! [`ProbeOutcome`] with `success = false`; an `Err` is reserved for
//! conditions the probe could not classify, and the health check manager turns
//! those into failed results as well.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client as HttpClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

use super::types::{NetworkDetails, ProbeDetails, ProbeKind, ProbeOutcome, TargetResult};
use crate::config::Config;
use crate::http::{ServiceClient, TokenProvider};

pub const NO_TOKEN: &str = "No authentication token available";

#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    async fn run(&self) -> Result<ProbeOutcome>;
}

/// One probe per kind, as consumed by the health check manager
#[derive(Clone)]
pub struct ProbeSet {
    pub service: Arc<dyn Probe>,
    pub network: Arc<dyn Probe>,
    pub authentication: Arc<dyn Probe>,
}

impl ProbeSet {
    /// Build the HTTP-backed probes for a configuration
    pub fn http(
        config: &Config,
        client: ServiceClient,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Self {
        let mut targets = config.monitoring.network_targets.clone();
        targets.push(client.base_url().to_string());

        Self {
            service: Arc::new(ServiceProbe::new(client.clone(), token_provider.clone())),
            network: Arc::new(NetworkProbe::new(
                client.http().clone(),
                targets,
                config.monitoring.network_timeout(),
            )),
            authentication: Arc::new(AuthenticationProbe::new(client, token_provider)),
        }
    }

    pub fn get(&self, kind: ProbeKind) -> Arc<dyn Probe> {
        match kind {
            ProbeKind::Service => self.service.clone(),
            ProbeKind::Network => self.network.clone(),
            ProbeKind::Authentication => self.authentication.clone(),
        }
    }
}

/// Authenticated identity call measuring service reachability
pub struct ServiceProbe {
    client: ServiceClient,
    token_provider: Arc<dyn TokenProvider>,
}

impl ServiceProbe {
    pub fn new(client: ServiceClient, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            token_provider,
        }
    }
}

#[async_trait]
impl Probe for ServiceProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Service
    }

    async fn run(&self) -> Result<ProbeOutcome> {
        let Some(token) = self.token_provider.get_token().await? else {
            return Ok(ProbeOutcome::failure(None, NO_TOKEN));
        };

        Ok(identity_outcome(self.client.fetch_identity(&token).await))
    }
}

/// Token presence plus an identity round trip
pub struct AuthenticationProbe {
    client: ServiceClient,
    token_provider: Arc<dyn TokenProvider>,
}

impl AuthenticationProbe {
    pub fn new(client: ServiceClient, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            token_provider,
        }
    }
}

#[async_trait]
impl Probe for AuthenticationProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Authentication
    }

    async fn run(&self) -> Result<ProbeOutcome> {
        let token = match self.token_provider.get_token().await? {
            Some(token) => token,
            None => {
                debug!("Authentication probe skipped: no token");
                return Ok(ProbeOutcome::failure(None, NO_TOKEN));
            }
        };

        Ok(identity_outcome(self.client.fetch_identity(&token).await))
    }
}

fn identity_outcome(
    result: std::result::Result<crate::http::Identity, crate::http::ServiceError>,
) -> ProbeOutcome {
    match result {
        Ok(identity) => ProbeOutcome::success(Some(ProbeDetails::Identity(identity))),
        Err(e) => ProbeOutcome::failure(e.status_code(), e.to_string()),
    }
}

/// Parallel HEAD requests against well-known hosts
pub struct NetworkProbe {
    client: HttpClient,
    targets: Vec<String>,
    per_target_timeout: Duration,
}

impl NetworkProbe {
    pub fn new(client: HttpClient, targets: Vec<String>, per_target_timeout: Duration) -> Self {
        Self {
            client,
            targets,
            per_target_timeout,
        }
    }

    async fn check_target(&self, url: &str) -> TargetResult {
        let started = Instant::now();
        let response = timeout(self.per_target_timeout, self.client.head(url).send()).await;
        let latency = started.elapsed();

        match response {
            // Any HTTP answer proves the host is reachable
            Ok(Ok(resp)) => TargetResult {
                url: url.to_string(),
                reachable: true,
                latency,
                status_code: Some(resp.status().as_u16()),
                error: None,
            },
            Ok(Err(e)) => TargetResult {
                url: url.to_string(),
                reachable: false,
                latency,
                status_code: None,
                error: Some(e.to_string()),
            },
            Err(_) => TargetResult {
                url: url.to_string(),
                reachable: false,
                latency,
                status_code: None,
                error: Some(format!(
                    "Timed out after {}ms",
                    self.per_target_timeout.as_millis()
                )),
            },
        }
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Network
    }

    async fn run(&self) -> Result<ProbeOutcome> {
        let checks = self.targets.iter().map(|url| self.check_target(url));
        let details = NetworkDetails::from_targets(join_all(checks).await);

        debug!(
            "Network probe: {:.0}% of {} targets reachable",
            details.connectivity_ratio * 100.0,
            details.targets.len()
        );

        if details.connectivity_ratio > 0.0 {
            Ok(ProbeOutcome::success(Some(ProbeDetails::Network(details))))
        } else {
            Ok(
                ProbeOutcome::failure(None, "No network targets reachable")
                    .with_details(ProbeDetails::Network(details)),
            )
        }
    }
}
