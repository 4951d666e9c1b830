// File: monitor/src/http/mod.rs
//! HTTP communication with the remote debrid service
//!
//! Every probe talks to the outside world through this module: the
//! authenticated identity call used by the service and authentication probes,
//! and the credential source those calls are signed with.
//!
//! # Architecture
//!
//! ```text
//! Probe → TokenProvider::get_token() → ServiceClient::fetch_identity()
//!                                            ↓
//!                       Identity | ServiceError (401 / 429 / 5xx / network)
//! ```

pub mod service_client;
pub mod token;

pub use service_client::{Identity, ServiceClient, ServiceError};
pub use token::{ConfiguredTokenProvider, TokenProvider};
