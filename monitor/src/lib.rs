pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod health;
pub mod http;
pub mod monitor;
pub mod reconnection;
pub mod scheduler;
pub mod services;
pub mod status;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use events::{StatusEvent, StatusPublisher};
pub use health::{HealthCheckManager, HealthCheckSettings, ProbeKind, ProbeResult, ProbeSet};
pub use http::{ConfiguredTokenProvider, ServiceClient, TokenProvider};
pub use monitor::{ConnectionMonitor, MonitorSettings, MonitoringStats};
pub use reconnection::{
    ReconnectionContext, ReconnectionManager, ReconnectionReason, ReconnectionResult, Strategy,
};
pub use services::AlertService;
pub use status::{OverallStatus, OverallStatusSnapshot};
