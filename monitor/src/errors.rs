//! Custom error types for the connection monitor
//!
//! Provides structured error handling with context for the failure scenarios
//! that are allowed to escape a call. Probe and reconnection failures are
//! reported as result records instead and never appear here.

use std::fmt;

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// HTTP communication error variants
#[derive(Debug)]
pub enum HttpError {
    /// Failed to build the HTTP client
    ClientBuild { reason: String },
}

/// Probe dispatch error variants
#[derive(Debug)]
pub enum ProbeError {
    /// Probe name does not match any registered probe
    UnknownProbe { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::ClientBuild { reason } => {
                write!(f, "Failed to build HTTP client: {}", reason)
            }
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::UnknownProbe { name } => write!(f, "Unknown probe: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for HttpError {}
impl std::error::Error for ProbeError {}
