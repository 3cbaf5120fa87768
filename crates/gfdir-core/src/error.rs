//! Error types for the directory pipeline
//!
//! Only the loader boundary, the remote source, configuration and the
//! preference store can fail. Normalization never produces an error:
//! malformed records degrade to defaults instead.

use std::time::Duration;

use thiserror::Error;

/// Directory pipeline error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Transport failure while talking to the remote endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Remote endpoint answered with a non-success status code
    #[error("HTTP status {0}")]
    Status(u16),

    /// Remote endpoint did not answer within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body could not be parsed as JSON
    #[error("Malformed JSON body: {0}")]
    MalformedBody(String),

    /// Invalid loader configuration (endpoint, status, timeout)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Preference store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, Error>;
