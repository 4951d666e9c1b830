//! Status aggregation: combine the three derived statuses into one overall
//! status and classify transitions between snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::thresholds;
use crate::health::{
    AuthState, AuthenticationStatus, NetworkState, NetworkStatus, ServiceState, ServiceStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Connected,
    Connecting,
    Limited,
    Disconnected,
    Error,
    Reconnecting,
}

impl OverallStatus {
    /// Ordering used for transition classification; higher is healthier
    pub fn priority(&self) -> u8 {
        match self {
            OverallStatus::Connected => 4,
            OverallStatus::Limited => 3,
            OverallStatus::Connecting | OverallStatus::Reconnecting => 2,
            OverallStatus::Disconnected => 1,
            OverallStatus::Error => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Connected => "connected",
            OverallStatus::Connecting => "connecting",
            OverallStatus::Limited => "limited",
            OverallStatus::Disconnected => "disconnected",
            OverallStatus::Error => "error",
            OverallStatus::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Initial,
    Improvement,
    Degradation,
    Critical,
}

/// Combined view of all three statuses at one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallStatusSnapshot {
    pub authentication: AuthenticationStatus,
    pub service: ServiceStatus,
    pub network: NetworkStatus,
    pub overall: OverallStatus,
    pub consecutive_errors: u32,
    pub last_updated: DateTime<Utc>,
}

impl OverallStatusSnapshot {
    /// Build a snapshot, deriving the overall status from the three parts
    pub fn new(
        authentication: AuthenticationStatus,
        service: ServiceStatus,
        network: NetworkStatus,
        consecutive_errors: u32,
    ) -> Self {
        let overall = derive_overall_status(&authentication, &service, &network);
        Self {
            authentication,
            service,
            network,
            overall,
            consecutive_errors,
            last_updated: Utc::now(),
        }
    }

    pub fn is_failing(&self) -> bool {
        matches!(
            self.overall,
            OverallStatus::Error | OverallStatus::Disconnected
        )
    }
}

/// First matching rule wins.
pub fn derive_overall_status(
    auth: &AuthenticationStatus,
    service: &ServiceStatus,
    network: &NetworkStatus,
) -> OverallStatus {
    overall_from_states(auth.state, service.state, network.state)
}

pub fn overall_from_states(
    auth: AuthState,
    service: ServiceState,
    network: NetworkState,
) -> OverallStatus {
    if network == NetworkState::Disconnected {
        return OverallStatus::Disconnected;
    }
    if matches!(auth, AuthState::Error | AuthState::Unauthenticated) {
        return OverallStatus::Error;
    }
    if service == ServiceState::Unavailable {
        return OverallStatus::Error;
    }
    if service == ServiceState::RateLimited {
        return OverallStatus::Limited;
    }
    if auth == AuthState::TokenExpired
        || network == NetworkState::PoorConnection
        || service == ServiceState::Degraded
    {
        return OverallStatus::Limited;
    }
    if auth == AuthState::Authenticated
        && service == ServiceState::Available
        && network == NetworkState::Connected
    {
        return OverallStatus::Connected;
    }
    OverallStatus::Connecting
}

pub fn classify_change(
    previous: Option<&OverallStatusSnapshot>,
    current: &OverallStatusSnapshot,
) -> ChangeKind {
    let Some(previous) = previous else {
        return ChangeKind::Initial;
    };

    if previous.overall == current.overall {
        let slower = match (previous.service.response_time, current.service.response_time) {
            (Some(before), Some(now)) => {
                now.as_secs_f64()
                    > before.as_secs_f64() * (1.0 + thresholds::RESPONSE_TIME_DEGRADATION)
            }
            _ => false,
        };
        if slower || current.consecutive_errors > previous.consecutive_errors {
            return ChangeKind::Degradation;
        }
        return ChangeKind::Improvement;
    }

    let before = previous.overall.priority();
    let now = current.overall.priority();
    if now < before {
        if now <= 1 {
            ChangeKind::Critical
        } else {
            ChangeKind::Degradation
        }
    } else {
        ChangeKind::Improvement
    }
}
