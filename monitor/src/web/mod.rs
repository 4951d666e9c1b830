// File: monitor/src/web/mod.rs
pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::monitor::ConnectionMonitor;
use crate::status::{OverallStatus, OverallStatusSnapshot};

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub monitor: ConnectionMonitor,
}

impl AppState {
    pub fn new(config: Arc<Config>, monitor: ConnectionMonitor) -> Self {
        Self { config, monitor }
    }
}

// Flattened view of a snapshot for API consumers
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub overall: OverallStatus,
    pub service: String,
    pub network: String,
    pub authentication: String,
    pub username: Option<String>,
    pub premium: Option<bool>,
    pub response_time_ms: Option<u64>,
    pub connectivity_ratio: f64,
    pub consecutive_errors: u32,
    pub last_error: Option<String>,
    pub last_updated: String,
    pub snapshot: OverallStatusSnapshot,
}
