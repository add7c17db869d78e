//! Error types for the MCP identity bridge
//!
//! This module defines all error types used throughout the bridge,
//! using `thiserror` for ergonomic error handling. The first four
//! variants form the request-level taxonomy; each maps to exactly one
//! HTTP status in `crate::server`.

use thiserror::Error;

/// Main error type for bridge operations
///
/// The request-level taxonomy (`Unauthenticated`, `UnknownSession`,
/// `Downstream`, `Transport`) is mapped to HTTP status codes in one
/// place, `crate::server::error_response`. The remaining variants cover
/// configuration loading and I/O plumbing.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Missing credential, or credential rejected by the downstream
    /// identity service
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Supplied session id is not present in the session table
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// The downstream identity call failed after authentication succeeded
    #[error("Downstream failure: {0}")]
    Downstream(String),

    /// Malformed frame or internal transport fault
    #[error("Transport fault: {0}")]
    Transport(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BridgeError {
    /// Stable kind tag used as the `error` field of HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Unauthenticated(_) => "Unauthenticated",
            BridgeError::UnknownSession(_) => "UnknownSession",
            BridgeError::Downstream(_) => "DownstreamFailure",
            BridgeError::Transport(_) => "TransportFault",
            BridgeError::Config(_) => "ConfigurationError",
            BridgeError::Io(_) => "IoError",
            BridgeError::Serialization(_) => "SerializationError",
            BridgeError::Yaml(_) => "YamlError",
            BridgeError::Http(_) => "HttpError",
        }
    }
}

/// Result type alias for bridge operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
