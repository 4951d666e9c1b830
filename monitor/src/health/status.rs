//! Pure derivation of service, network and authentication status from the
//! latest stored probe results

use std::time::Duration;

use super::probes::NO_TOKEN;
use super::types::{
    AuthState, AuthenticationStatus, NetworkState, NetworkStatus, ProbeResult, ServiceState,
    ServiceStatus,
};
use crate::config::MonitoringConfig;
use crate::constants::thresholds;

/// Latency limits applied during derivation
#[derive(Debug, Clone, Copy)]
pub struct StatusThresholds {
    pub high_latency: Duration,
    pub poor_network_latency: Duration,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            high_latency: Duration::from_millis(thresholds::HIGH_LATENCY_MS),
            poor_network_latency: Duration::from_millis(thresholds::POOR_NETWORK_LATENCY_MS),
        }
    }
}

impl From<&MonitoringConfig> for StatusThresholds {
    fn from(config: &MonitoringConfig) -> Self {
        Self {
            high_latency: Duration::from_millis(config.high_latency_ms),
            poor_network_latency: Duration::from_millis(config.poor_latency_ms),
        }
    }
}

pub fn derive_service_status(
    service: Option<&ProbeResult>,
    network: Option<&ProbeResult>,
    limits: &StatusThresholds,
) -> ServiceStatus {
    let Some(result) = service else {
        return ServiceStatus {
            state: ServiceState::Unknown,
            response_time: None,
            error_rate: 0,
            consecutive_failures: 0,
            last_error: None,
            last_check: None,
        };
    };

    let state = if result.success {
        if result.response_time > limits.high_latency {
            ServiceState::Degraded
        } else {
            ServiceState::Available
        }
    } else {
        match result.status_code {
            Some(429) => ServiceState::RateLimited,
            Some(code) if (500..600).contains(&code) => ServiceState::Unavailable,
            _ if network_failing(network) => ServiceState::Unavailable,
            _ => ServiceState::Degraded,
        }
    };

    ServiceStatus {
        state,
        response_time: Some(result.response_time),
        error_rate: if result.success { 0 } else { 100 },
        consecutive_failures: if result.success { 0 } else { 1 },
        last_error: result.error.clone(),
        last_check: Some(result.timestamp),
    }
}

pub fn derive_network_status(
    network: Option<&ProbeResult>,
    limits: &StatusThresholds,
) -> NetworkStatus {
    let Some(result) = network else {
        return NetworkStatus {
            state: NetworkState::Unknown,
            online: false,
            average_latency: None,
            connectivity_ratio: 0.0,
            connection_type: None,
            last_check: None,
        };
    };

    let details = result.network();
    let ratio = details.map(|d| d.connectivity_ratio).unwrap_or(0.0);
    let average_latency = details.and_then(|d| d.average_latency());
    let slow = average_latency
        .map(|latency| latency > limits.poor_network_latency)
        .unwrap_or(false);

    let state = if !result.success || ratio <= 0.0 {
        NetworkState::Disconnected
    } else if ratio < thresholds::MIN_CONNECTIVITY_RATIO || slow {
        NetworkState::PoorConnection
    } else {
        NetworkState::Connected
    };

    NetworkStatus {
        state,
        online: ratio > 0.0,
        average_latency,
        connectivity_ratio: ratio,
        connection_type: average_latency.map(effective_connection_type),
        last_check: Some(result.timestamp),
    }
}

pub fn derive_auth_status(authentication: Option<&ProbeResult>) -> AuthenticationStatus {
    let Some(result) = authentication else {
        return AuthenticationStatus {
            state: AuthState::Unauthenticated,
            can_refresh: false,
            last_validated: None,
            identity: None,
            last_error: None,
        };
    };

    let state = if result.success {
        AuthState::Authenticated
    } else {
        match result.error.as_deref() {
            Some(NO_TOKEN) => AuthState::Unauthenticated,
            Some(error) if error.to_lowercase().contains("expired") => AuthState::TokenExpired,
            _ => AuthState::Error,
        }
    };

    let identity = result.identity().cloned();

    AuthenticationStatus {
        state,
        can_refresh: identity.is_some(),
        last_validated: result.success.then_some(result.timestamp),
        identity,
        last_error: result.error.clone(),
    }
}

fn network_failing(network: Option<&ProbeResult>) -> bool {
    match network {
        Some(result) => {
            !result.success
                || result
                    .network()
                    .map(|d| d.connectivity_ratio <= 0.0)
                    .unwrap_or(false)
        }
        None => false,
    }
}

/// Round-trip based classification following the Network Information API
fn effective_connection_type(latency: Duration) -> String {
    let ms = latency.as_millis();
    let kind = if ms >= 2000 {
        "slow-2g"
    } else if ms >= 1400 {
        "2g"
    } else if ms >= 270 {
        "3g"
    } else {
        "4g"
    };
    kind.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::types::{NetworkDetails, ProbeDetails, ProbeKind, TargetResult};
    use crate::http::Identity;
    use chrono::Utc;

    fn result(probe: ProbeKind, success: bool, ms: u64) -> ProbeResult {
        ProbeResult {
            probe,
            success,
            response_time: Duration::from_millis(ms),
            timestamp: Utc::now(),
            status_code: None,
            error: (!success).then(|| "failed".to_string()),
            details: None,
        }
    }

    fn failed_with(probe: ProbeKind, code: Option<u16>, error: &str) -> ProbeResult {
        ProbeResult {
            status_code: code,
            error: Some(error.to_string()),
            ..result(probe, false, 100)
        }
    }

    fn network(reachable: &[(bool, u64)]) -> ProbeResult {
        let targets = reachable
            .iter()
            .map(|(ok, ms)| TargetResult {
                url: "https://example.com".to_string(),
                reachable: *ok,
                latency: Duration::from_millis(*ms),
                status_code: None,
                error: None,
            })
            .collect();
        let details = NetworkDetails::from_targets(targets);
        ProbeResult {
            success: details.connectivity_ratio > 0.0,
            details: Some(ProbeDetails::Network(details)),
            ..result(ProbeKind::Network, true, 100)
        }
    }

    #[test]
    fn test_service_available_and_slow() {
        let limits = StatusThresholds::default();
        let fast = result(ProbeKind::Service, true, 200);
        let slow = result(ProbeKind::Service, true, 6000);

        let status = derive_service_status(Some(&fast), None, &limits);
        assert_eq!(status.state, ServiceState::Available);
        assert_eq!(status.error_rate, 0);
        assert_eq!(status.consecutive_failures, 0);

        assert_eq!(
            derive_service_status(Some(&slow), None, &limits).state,
            ServiceState::Degraded
        );
    }

    #[test]
    fn test_service_failure_classification() {
        let limits = StatusThresholds::default();
        let healthy_network = network(&[(true, 50), (true, 60)]);
        let dead_network = network(&[(false, 5000), (false, 5000)]);

        let limited = failed_with(ProbeKind::Service, Some(429), "HTTP 429: slow down");
        let down = failed_with(ProbeKind::Service, Some(503), "HTTP 503: maintenance");
        let refused = failed_with(ProbeKind::Service, None, "Connection failed");
        let forbidden = failed_with(ProbeKind::Service, Some(403), "HTTP 403");

        assert_eq!(
            derive_service_status(Some(&limited), Some(&healthy_network), &limits).state,
            ServiceState::RateLimited
        );
        assert_eq!(
            derive_service_status(Some(&down), Some(&healthy_network), &limits).state,
            ServiceState::Unavailable
        );
        assert_eq!(
            derive_service_status(Some(&refused), Some(&dead_network), &limits).state,
            ServiceState::Unavailable
        );
        let degraded = derive_service_status(Some(&forbidden), Some(&healthy_network), &limits);
        assert_eq!(degraded.state, ServiceState::Degraded);
        assert_eq!(degraded.error_rate, 100);
        assert_eq!(degraded.consecutive_failures, 1);
        assert_eq!(degraded.last_error.as_deref(), Some("HTTP 403"));
    }

    #[test]
    fn test_service_unknown_without_result() {
        let status = derive_service_status(None, None, &StatusThresholds::default());
        assert_eq!(status.state, ServiceState::Unknown);
        assert!(status.response_time.is_none());
    }

    #[test]
    fn test_network_states() {
        let limits = StatusThresholds::default();

        let good = derive_network_status(Some(&network(&[(true, 100), (true, 300)])), &limits);
        assert_eq!(good.state, NetworkState::Connected);
        assert!(good.online);
        assert_eq!(good.connection_type.as_deref(), Some("4g"));

        let sparse = derive_network_status(
            Some(&network(&[(true, 100), (false, 0), (false, 0), (false, 0)])),
            &limits,
        );
        assert_eq!(sparse.state, NetworkState::PoorConnection);

        let slow = derive_network_status(Some(&network(&[(true, 2500), (true, 2600)])), &limits);
        assert_eq!(slow.state, NetworkState::PoorConnection);
        assert_eq!(slow.connection_type.as_deref(), Some("slow-2g"));

        let down = derive_network_status(Some(&network(&[(false, 0), (false, 0)])), &limits);
        assert_eq!(down.state, NetworkState::Disconnected);
        assert!(!down.online);

        let failed = derive_network_status(
            Some(&failed_with(ProbeKind::Network, None, "panicked")),
            &limits,
        );
        assert_eq!(failed.state, NetworkState::Disconnected);
    }

    #[test]
    fn test_auth_states() {
        assert_eq!(derive_auth_status(None).state, AuthState::Unauthenticated);

        let no_token = failed_with(ProbeKind::Authentication, None, NO_TOKEN);
        assert_eq!(
            derive_auth_status(Some(&no_token)).state,
            AuthState::Unauthenticated
        );

        let expired = failed_with(ProbeKind::Authentication, Some(401), "HTTP 401: Token Expired");
        assert_eq!(derive_auth_status(Some(&expired)).state, AuthState::TokenExpired);

        let rejected = failed_with(ProbeKind::Authentication, Some(401), "HTTP 401: bad_token");
        let status = derive_auth_status(Some(&rejected));
        assert_eq!(status.state, AuthState::Error);
        assert!(!status.can_refresh);
        assert!(status.last_validated.is_none());
    }

    #[test]
    fn test_authenticated_carries_identity() {
        let identity = Identity {
            id: 1,
            username: "alice".to_string(),
            email: None,
            premium: 3600,
            expiration: None,
            user_type: Some("premium".to_string()),
        };
        let ok = ProbeResult {
            details: Some(ProbeDetails::Identity(identity.clone())),
            ..result(ProbeKind::Authentication, true, 120)
        };

        let status = derive_auth_status(Some(&ok));
        assert_eq!(status.state, AuthState::Authenticated);
        assert!(status.can_refresh);
        assert_eq!(status.last_validated, Some(ok.timestamp));
        assert_eq!(status.identity, Some(identity));
    }
}
