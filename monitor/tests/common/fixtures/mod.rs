//! This module provides reusable test utilities:
//! - Scripted probes and token providers
//! - Mock HTTP servers (debrid API, webhook)
//! - Test configuration builders
//! - Common test data

// Allow unused code in test fixtures - each test binary uses a subset
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_probes;
pub mod mock_service;
pub mod mock_webhook;
pub mod test_config;
pub mod test_data;

// Re-export commonly used items
pub use mock_probes::{MockTokenProvider, ScriptedProbe, Step, TestHarness};
pub use mock_service::MockServiceServer;
pub use mock_webhook::MockWebhookServer;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
