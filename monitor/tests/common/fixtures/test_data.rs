//! Common test data and constants

use chrono::Utc;

/// Get current timestamp for testing
pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

/// Common bearer tokens
pub mod tokens {
    pub const VALID: &str = "valid-token";
    pub const REVOKED: &str = "revoked-token";
    pub const EXPIRED: &str = "expired-token";
}

/// Debrid API error bodies
pub mod api_errors {
    pub const BAD_TOKEN: &str = r#"{"error":"bad_token","error_code":8}"#;
    pub const TOKEN_EXPIRED: &str = r#"{"error":"token_expired","error_code":9}"#;
    pub const TOO_MANY_REQUESTS: &str = r#"{"error":"too_many_requests","error_code":34}"#;
    pub const SERVICE_UNAVAILABLE: &str = r#"{"error":"service_unavailable","error_code":25}"#;
}
