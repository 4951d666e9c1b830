//! Central repository for timeouts, intervals, thresholds and limits
//!
//! This module organizes constants by category so the defaults used by the
//! configuration layer, the probes and the reconnection loop share a single
//! source of truth.

use std::time::Duration;

/// HTTP client timeout constants
pub mod http {
    use super::Duration;

    /// Timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// User agent sent with every probe request
    pub const USER_AGENT: &str = concat!("connection-monitor/", env!("CARGO_PKG_VERSION"));
}

/// Thresholds used when deriving statuses from probe results
pub mod thresholds {
    /// Service responses slower than this are reported as degraded
    pub const HIGH_LATENCY_MS: u64 = 5000;

    /// Average network latency above this is a poor connection
    pub const POOR_NETWORK_LATENCY_MS: u64 = 2000;

    /// Minimum share of reachable targets for a healthy network
    pub const MIN_CONNECTIVITY_RATIO: f64 = 0.5;

    /// Response time growth (as a fraction) that counts as a degradation
    pub const RESPONSE_TIME_DEGRADATION: f64 = 0.5;
}

/// Reconnection backoff constants
pub mod reconnection {
    /// Maximum attempts per reconnection run
    pub const MAX_ATTEMPTS: u32 = 10;

    /// Delay before the second attempt
    pub const BASE_DELAY_MS: u64 = 1000;

    /// Upper bound for any single backoff delay
    pub const MAX_DELAY_MS: u64 = 60_000;

    /// Growth factor between consecutive delays
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Maximum jitter added on top of a computed delay
    pub const JITTER_FACTOR: f64 = 0.1;

    /// Attempt at which a service outage tries a token refresh
    pub const SERVICE_TOKEN_REFRESH_ATTEMPT: u32 = 4;

    /// Error reported when a second run is requested while one is active
    pub const ALREADY_IN_PROGRESS: &str = "Reconnection already in progress";

    /// Error reported by a run stopped before it finished
    pub const RUN_CANCELLED: &str = "Reconnection cancelled";
}

/// Default configuration values
pub mod defaults {
    /// Default debrid API base URL
    pub const SERVICE_BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";

    /// Identity endpoint relative to the base URL
    pub const IDENTITY_PATH: &str = "/user";

    /// Default service probe interval in seconds
    pub const SERVICE_CHECK_INTERVAL_SECONDS: u64 = 30;

    /// Default network probe interval in seconds
    pub const NETWORK_CHECK_INTERVAL_SECONDS: u64 = 60;

    /// Default service timeout in seconds
    pub const SERVICE_TIMEOUT_SECONDS: u64 = 10;

    /// Default per-target network timeout in seconds
    pub const NETWORK_TIMEOUT_SECONDS: u64 = 5;

    /// Well-known, highly available reachability targets
    pub const NETWORK_TARGETS: [&str; 3] = [
        "https://www.google.com",
        "https://www.cloudflare.com",
        "https://www.github.com",
    ];

    /// Default bind address for the status API
    pub const WEB_HOST: &str = "127.0.0.1";

    /// Default port for the status API
    pub const WEB_PORT: u16 = 8095;

    /// Capacity of the status event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
}

/// Alert delivery constants
pub mod alerts {
    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT_SECONDS: u64 = 10;
}
