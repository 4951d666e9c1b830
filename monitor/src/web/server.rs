// File: monitor/src/web/server.rs
use crate::config::WebConfig;
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server<F>(state: AppState, web: &WebConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    let addr = format!("{}:{}", web.host, web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === STATUS ROUTES ===
        .route("/api/status", get(handlers::get_current_status))
        .route("/api/stats", get(handlers::get_monitoring_stats))
        .route("/api/probes", get(handlers::get_latest_probes))
        // === MANUAL TRIGGERS ===
        .route("/api/health/check", post(handlers::run_health_check))
        .route("/api/reconnect", post(handlers::trigger_reconnection))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
