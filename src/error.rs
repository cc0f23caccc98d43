//! Error types
//!
//! `InvocationError` covers failures while a function reads its invocation,
//! `HostError` covers everything the hosting side can trip over.

use thiserror::Error;

/// Failure decoding the payload carried by an invocation
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("body is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("body is flagged as base64 but does not decode: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("body nests arrays or objects deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Failure in the hosting runtime (startup, local invoke)
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address '{addr}': {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("function '{name}' is not registered (available: {available})")]
    UnknownFunction { name: String, available: String },

    #[error("invalid event JSON: {0}")]
    Event(#[from] serde_json::Error),
}
