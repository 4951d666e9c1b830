// File: monitor/src/config/manager.rs
use super::Config;
use crate::errors::ConfigError;
use anyhow::Result;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    /// Parse and validate a configuration document.
    pub fn parse(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        debug!("Loading configuration: {}", main_config_path);

        let main_config_content =
            fs::read_to_string(&main_config_path)
                .await
                .map_err(|e| ConfigError::LoadFailed {
                    path: main_config_path.clone(),
                    reason: e.to_string(),
                })?;

        let config = Self::parse(&main_config_content)?;

        info!(
            "Loaded configuration: service {} ({} network targets, monitoring {}, auto-reconnect {})",
            config.service.base_url,
            config.monitoring.network_targets.len(),
            if config.monitoring.enabled { "enabled" } else { "disabled" },
            if config.monitoring.auto_reconnect { "on" } else { "off" }
        );

        Ok(config)
    }

    fn validate(config: &Config) -> std::result::Result<(), ConfigError> {
        if config.service.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "service.base_url".to_string(),
            });
        }

        if config.service.api_token.is_some() && config.service.token_file.is_some() {
            return Err(ConfigError::InvalidValue {
                field: "service.token_file".to_string(),
                reason: "set either api_token or token_file, not both".to_string(),
            });
        }

        let positive = [
            ("service.timeout_seconds", config.service.timeout_seconds),
            (
                "monitoring.service_check_interval_seconds",
                config.monitoring.service_check_interval_seconds,
            ),
            (
                "monitoring.network_check_interval_seconds",
                config.monitoring.network_check_interval_seconds,
            ),
            (
                "monitoring.network_timeout_seconds",
                config.monitoring.network_timeout_seconds,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let reconnection = &config.reconnection;
        if reconnection.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if reconnection.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.backoff_multiplier".to_string(),
                reason: format!("{} is below 1.0", reconnection.backoff_multiplier),
            });
        }
        if reconnection.max_delay_ms < reconnection.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.max_delay_ms".to_string(),
                reason: format!(
                    "{} is below base_delay_ms {}",
                    reconnection.max_delay_ms, reconnection.base_delay_ms
                ),
            });
        }

        Ok(())
    }
}
