//! Health check types: probe results and the statuses derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ProbeError;
use crate::http::Identity;

/// The three independent probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Service,
    Network,
    Authentication,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 3] = [
        ProbeKind::Service,
        ProbeKind::Network,
        ProbeKind::Authentication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Service => "service",
            ProbeKind::Network => "network",
            ProbeKind::Authentication => "authentication",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(ProbeKind::Service),
            "network" => Ok(ProbeKind::Network),
            "authentication" => Ok(ProbeKind::Authentication),
            other => Err(ProbeError::UnknownProbe {
                name: other.to_string(),
            }),
        }
    }
}

/// Outcome of one probe execution. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: ProbeKind,
    pub success: bool,
    #[serde(with = "duration_ms", rename = "response_time_ms")]
    pub response_time: Duration,
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub details: Option<ProbeDetails>,
}

impl ProbeResult {
    pub fn from_outcome(
        probe: ProbeKind,
        outcome: ProbeOutcome,
        response_time: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            probe,
            success: outcome.success,
            response_time,
            timestamp,
            status_code: outcome.status_code,
            error: outcome.error,
            details: outcome.details,
        }
    }

    pub fn failed(
        probe: ProbeKind,
        error: impl Into<String>,
        response_time: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            probe,
            success: false,
            response_time,
            timestamp,
            status_code: None,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.details {
            Some(ProbeDetails::Identity(identity)) => Some(identity),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<&NetworkDetails> {
        match &self.details {
            Some(ProbeDetails::Network(details)) => Some(details),
            _ => None,
        }
    }
}

/// What a probe reports; timing is added by the health check manager
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub details: Option<ProbeDetails>,
}

impl ProbeOutcome {
    pub fn success(details: Option<ProbeDetails>) -> Self {
        Self {
            success: true,
            details,
            ..Default::default()
        }
    }

    pub fn failure(status_code: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ProbeDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Probe-specific structured details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeDetails {
    Identity(Identity),
    Network(NetworkDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDetails {
    pub targets: Vec<TargetResult>,
    pub connectivity_ratio: f64,
}

impl NetworkDetails {
    pub fn from_targets(targets: Vec<TargetResult>) -> Self {
        let connectivity_ratio = if targets.is_empty() {
            0.0
        } else {
            targets.iter().filter(|t| t.reachable).count() as f64 / targets.len() as f64
        };
        Self {
            targets,
            connectivity_ratio,
        }
    }

    /// Mean latency of reachable targets, if any were reachable
    pub fn average_latency(&self) -> Option<Duration> {
        let reachable: Vec<_> = self.targets.iter().filter(|t| t.reachable).collect();
        if reachable.is_empty() {
            return None;
        }
        let total: u128 = reachable.iter().map(|t| t.latency.as_millis()).sum();
        Some(Duration::from_millis(
            (total / reachable.len() as u128) as u64,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResult {
    pub url: String,
    pub reachable: bool,
    #[serde(with = "duration_ms", rename = "latency_ms")]
    pub latency: Duration,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Unknown,
    Available,
    Degraded,
    RateLimited,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    #[serde(with = "option_duration_ms", rename = "response_time_ms")]
    pub response_time: Option<Duration>,
    /// 0 or 100: computed from the single retained result
    pub error_rate: u8,
    /// 0 or 1: computed from the single retained result
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    Unknown,
    Connected,
    PoorConnection,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub state: NetworkState,
    pub online: bool,
    #[serde(with = "option_duration_ms", rename = "average_latency_ms")]
    pub average_latency: Option<Duration>,
    pub connectivity_ratio: f64,
    /// Effective connection type hint: 4g, 3g, 2g or slow-2g
    pub connection_type: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    TokenExpired,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationStatus {
    pub state: AuthState,
    pub can_refresh: bool,
    pub last_validated: Option<DateTime<Utc>>,
    pub identity: Option<Identity>,
    pub last_error: Option<String>,
}

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

pub(crate) mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
