// File: monitor/src/config/mod.rs
pub mod manager;
use crate::constants::{defaults, reconnection, thresholds};
use serde::{Deserialize, Serialize};
use std::time::Duration;
pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alarm_webhook_url: String,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub reconnection: ReconnectionConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_identity_path")]
    pub identity_path: String,
    // Either an inline token or a file rotated by the OAuth collaborator
    pub api_token: Option<String>,
    pub token_file: Option<String>,
    #[serde(default = "default_service_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,
    #[serde(default = "default_service_interval")]
    pub service_check_interval_seconds: u64,
    #[serde(default = "default_network_interval")]
    pub network_check_interval_seconds: u64,
    #[serde(default = "default_network_timeout")]
    pub network_timeout_seconds: u64,
    #[serde(default = "default_network_targets")]
    pub network_targets: Vec<String>,
    #[serde(default = "default_high_latency")]
    pub high_latency_ms: u64,
    #[serde(default = "default_poor_latency")]
    pub poor_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    defaults::SERVICE_BASE_URL.to_string()
}

fn default_identity_path() -> String {
    defaults::IDENTITY_PATH.to_string()
}

fn default_service_timeout() -> u64 {
    defaults::SERVICE_TIMEOUT_SECONDS
}

fn default_service_interval() -> u64 {
    defaults::SERVICE_CHECK_INTERVAL_SECONDS
}

fn default_network_interval() -> u64 {
    defaults::NETWORK_CHECK_INTERVAL_SECONDS
}

fn default_network_timeout() -> u64 {
    defaults::NETWORK_TIMEOUT_SECONDS
}

fn default_network_targets() -> Vec<String> {
    defaults::NETWORK_TARGETS.iter().map(|t| t.to_string()).collect()
}

fn default_high_latency() -> u64 {
    thresholds::HIGH_LATENCY_MS
}

fn default_poor_latency() -> u64 {
    thresholds::POOR_NETWORK_LATENCY_MS
}

fn default_max_attempts() -> u32 {
    reconnection::MAX_ATTEMPTS
}

fn default_base_delay() -> u64 {
    reconnection::BASE_DELAY_MS
}

fn default_max_delay() -> u64 {
    reconnection::MAX_DELAY_MS
}

fn default_backoff_multiplier() -> f64 {
    reconnection::BACKOFF_MULTIPLIER
}

fn default_web_host() -> String {
    defaults::WEB_HOST.to_string()
}

fn default_web_port() -> u16 {
    defaults::WEB_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alarm_webhook_url: String::new(),
            service: ServiceConfig::default(),
            monitoring: MonitoringConfig::default(),
            reconnection: ReconnectionConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            identity_path: default_identity_path(),
            api_token: None,
            token_file: None,
            timeout_seconds: default_service_timeout(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_reconnect: true,
            service_check_interval_seconds: default_service_interval(),
            network_check_interval_seconds: default_network_interval(),
            network_timeout_seconds: default_network_timeout(),
            network_targets: default_network_targets(),
            high_latency_ms: default_high_latency(),
            poor_latency_ms: default_poor_latency(),
        }
    }
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl ServiceConfig {
    pub fn identity_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.identity_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl MonitoringConfig {
    pub fn service_interval(&self) -> Duration {
        Duration::from_secs(self.service_check_interval_seconds)
    }

    pub fn network_interval(&self) -> Duration {
        Duration::from_secs(self.network_check_interval_seconds)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_seconds)
    }
}

impl ReconnectionConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
