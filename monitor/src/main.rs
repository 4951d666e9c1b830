// File: monitor/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use connection_monitor::health::{HealthCheckManager, HealthCheckSettings, ProbeSet};
use connection_monitor::http::{ConfiguredTokenProvider, ServiceClient, TokenProvider};
use connection_monitor::web::{start_web_server, AppState};
use connection_monitor::{
    AlertService, ConfigManager, ConnectionMonitor, MonitorSettings, ReconnectionManager,
    StatusPublisher,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("connection_monitor=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Connection Monitor");

    // Load configuration
    let config_dir = std::env::var("MONITOR_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded: service {}, {} network targets, auto-reconnect {}",
        config.service.base_url,
        config.monitoring.network_targets.len(),
        config.monitoring.auto_reconnect
    );

    let token_provider: Arc<dyn TokenProvider> =
        Arc::new(ConfiguredTokenProvider::from_config(&config.service));
    match token_provider.get_token().await {
        Ok(Some(_)) => info!("Service credential available"),
        Ok(None) => warn!(
            "No service credential configured; authentication will report unauthenticated"
        ),
        Err(e) => warn!("Failed to read service credential: {}", e),
    }

    let client = ServiceClient::new(config.service.clone())?;
    let probes = ProbeSet::http(&config, client, token_provider.clone());
    let events = StatusPublisher::new();

    let health = Arc::new(HealthCheckManager::new(
        probes,
        HealthCheckSettings::from(&config.monitoring),
    ));
    let reconnection = Arc::new(ReconnectionManager::new(
        health.clone(),
        token_provider,
        config.reconnection.clone(),
        events.clone(),
    ));
    let monitor = ConnectionMonitor::new(
        health,
        reconnection,
        events.clone(),
        MonitorSettings::from(config.as_ref()),
    );
    info!("Health check and reconnection managers initialized");

    let alert_service = AlertService::new(
        config.alarm_webhook_url.clone(),
        config.service.base_url.clone(),
    )?;
    if alert_service.is_enabled() {
        info!("Alert service enabled");
    } else {
        warn!("No webhook URL configured in config/main.toml, alerts will only be logged");
    }
    let alert_listener = alert_service.spawn_listener(events.subscribe());

    monitor.start_monitoring().await;

    let state = AppState::new(config.clone(), monitor.clone());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    };

    if let Err(e) = start_web_server(state, &config.web, shutdown).await {
        error!("Web server error: {}", e);
    }

    monitor.stop_monitoring().await;
    alert_listener.abort();
    info!("Connection Monitor stopped");

    Ok(())
}
