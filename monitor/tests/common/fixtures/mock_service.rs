//! Mock debrid API server for testing the HTTP-backed probes
//!
//! Serves the identity endpoint under `/rest/1.0/user`, keyed on the bearer
//! token so one server can answer for several scenarios at once.

use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use super::test_data::{api_errors, tokens};

pub const IDENTITY_PATH: &str = "/rest/1.0/user";

pub struct MockServiceServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockServiceServer {
    /// Start a new mock API server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = format!("{}/rest/1.0", server.uri());
        Self { server, base_url }
    }

    /// Server root, for use as a reachability target
    pub fn root_url(&self) -> String {
        self.server.uri()
    }

    pub fn identity_body() -> serde_json::Value {
        json!({
            "id": 1234,
            "username": "streamer",
            "email": "streamer@example.com",
            "points": 120,
            "locale": "en",
            "avatar": "https://example.com/avatar.png",
            "type": "premium",
            "premium": 2592000,
            "expiration": "2030-01-01T00:00:00.000Z"
        })
    }

    /// Valid token answers with the identity
    pub async fn mock_identity_success(&self) {
        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .and(header("authorization", format!("Bearer {}", tokens::VALID).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::identity_body()))
            .mount(&self.server)
            .await;
    }

    /// Revoked token answers 401 bad_token, expired token answers 401 token_expired
    pub async fn mock_unauthorized(&self) {
        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .and(header("authorization", format!("Bearer {}", tokens::REVOKED).as_str()))
            .respond_with(ResponseTemplate::new(401).set_body_string(api_errors::BAD_TOKEN))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .and(header("authorization", format!("Bearer {}", tokens::EXPIRED).as_str()))
            .respond_with(ResponseTemplate::new(401).set_body_string(api_errors::TOKEN_EXPIRED))
            .mount(&self.server)
            .await;
    }

    /// Every identity call answers with the given status and body
    pub async fn mock_identity_status(&self, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Identity call that answers only after `delay`
    pub async fn mock_identity_slow(&self, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Self::identity_body())
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer reachability HEAD requests on any path
    pub async fn mock_reachable(&self) {
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }
}
