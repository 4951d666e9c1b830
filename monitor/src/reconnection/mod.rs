//! Reconnection: strategy selection, backoff and the run records produced by
//! the [`ReconnectionManager`]
//!
//! A run walks attempts `1..=max_attempts`. Each attempt picks a strategy from
//! the failure reason and the attempt number, waits out an exponential
//! backoff (skipped for the first attempt), then verifies recovery through the
//! health check manager's probes.

pub mod manager;

pub use manager::{ReconnectionManager, ReconnectionRun, ReconnectionStats};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ReconnectionConfig;
use crate::constants::reconnection;
use crate::health::types::duration_ms;
use crate::status::OverallStatusSnapshot;

/// Why a reconnection was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectionReason {
    Authentication,
    ServiceUnavailable,
    NetworkDisconnect,
    Manual,
    #[serde(other)]
    Unknown,
}

impl ReconnectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconnectionReason::Authentication => "authentication",
            ReconnectionReason::ServiceUnavailable => "service_unavailable",
            ReconnectionReason::NetworkDisconnect => "network_disconnect",
            ReconnectionReason::Manual => "manual",
            ReconnectionReason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReconnectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconnectionReason {
    type Err = Infallible;

    /// Unrecognized reasons map to [`ReconnectionReason::Unknown`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "authentication" => ReconnectionReason::Authentication,
            "service_unavailable" => ReconnectionReason::ServiceUnavailable,
            "network_disconnect" => ReconnectionReason::NetworkDisconnect,
            "manual" => ReconnectionReason::Manual,
            _ => ReconnectionReason::Unknown,
        })
    }
}

/// Recovery procedure executed by one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    TokenRefresh,
    FullReauth,
    Retry,
    NetworkWait,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::TokenRefresh => "token_refresh",
            Strategy::FullReauth => "full_reauth",
            Strategy::Retry => "retry",
            Strategy::NetworkWait => "network_wait",
        };
        f.write_str(name)
    }
}

pub fn select_strategy(reason: ReconnectionReason, attempt: u32) -> Strategy {
    match reason {
        ReconnectionReason::Authentication => match attempt {
            1 => Strategy::TokenRefresh,
            2 => Strategy::FullReauth,
            _ => Strategy::Retry,
        },
        ReconnectionReason::ServiceUnavailable => {
            if attempt == reconnection::SERVICE_TOKEN_REFRESH_ATTEMPT {
                Strategy::TokenRefresh
            } else {
                Strategy::Retry
            }
        }
        ReconnectionReason::NetworkDisconnect => Strategy::NetworkWait,
        ReconnectionReason::Manual => {
            if attempt == 1 {
                Strategy::TokenRefresh
            } else {
                Strategy::Retry
            }
        }
        ReconnectionReason::Unknown => Strategy::Retry,
    }
}

/// Exponential backoff with optional jitter
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl BackoffPolicy {
    pub fn from_config(config: &ReconnectionConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }

    /// Delay for `attempt` before jitter: `min(base * multiplier^(attempt-1), max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Add up to 10% random jitter when enabled
    pub fn with_jitter(&self, delay: Duration) -> Duration {
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(0.0..=reconnection::JITTER_FACTOR);
        delay + delay.mul_f64(factor)
    }
}

/// Input to one reconnection run
#[derive(Debug, Clone)]
pub struct ReconnectionContext {
    pub reason: ReconnectionReason,
    pub previous: Option<OverallStatusSnapshot>,
    pub max_attempts: Option<u32>,
    pub base_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
}

impl ReconnectionContext {
    pub fn new(reason: ReconnectionReason) -> Self {
        Self {
            reason,
            previous: None,
            max_attempts: None,
            base_delay: None,
            max_delay: None,
        }
    }

    pub fn with_previous(mut self, previous: Option<OverallStatusSnapshot>) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = Some(base_delay);
        self.max_delay = Some(max_delay);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectionAttempt {
    pub attempt: u32,
    pub strategy: Strategy,
    #[serde(with = "duration_ms", rename = "delay_ms")]
    pub delay: Duration,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectionResult {
    pub success: bool,
    pub attempts: u32,
    #[serde(with = "duration_ms", rename = "duration_ms")]
    pub duration: Duration,
    pub error: Option<String>,
    pub strategy: Option<Strategy>,
    pub snapshot: Option<OverallStatusSnapshot>,
}

impl ReconnectionResult {
    pub fn failure(attempts: u32, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            success: false,
            attempts,
            duration,
            error: Some(error.into()),
            strategy: None,
            snapshot: None,
        }
    }
}
