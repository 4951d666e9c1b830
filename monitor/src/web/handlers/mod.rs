//! HTTP request handlers for the status API.
//!
//! - `common` - Shared response envelope, query structs and conversions
//! - `health` - Current status, stats and on-demand probe runs
//! - `reconnection` - Manual reconnection trigger

pub mod common;
pub mod health;
pub mod reconnection;

pub use health::*;
pub use reconnection::*;
