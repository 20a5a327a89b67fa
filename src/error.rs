//! Error types for the bounce relay.

use std::time::Duration;

/// Top-level error type for one relay invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Directory unavailable: {0}")]
    Directory(#[from] DirectoryError),
}

impl Error {
    /// Whether this error stems from a malformed inbound event rather than
    /// a failure on our side.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Self::Event(_))
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors decoding the inbound receipt notification.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event contains no records")]
    NoRecords,
}

/// Blob retrieval errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Object {key} not found in {container}")]
    NotFound { container: String, key: String },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Email parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Message is empty")]
    Empty,

    #[error("Message could not be parsed as RFC 5322")]
    Malformed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory errors. Every variant means the directory is unavailable and
/// the deliverable/unknown split cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Bind as {dn} failed: {reason}")]
    Bind { dn: String, reason: String },

    #[error("Lookup of {address} failed: {reason}")]
    Query { address: String, reason: String },

    #[error("Lookup of {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },
}

/// Per-recipient local delivery errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Delivery to {address} rejected: {reason}")]
    Rejected { address: String, reason: String },

    #[error("Delivery to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("No raw message available for {address}")]
    EmptyMessage { address: String },
}

/// Templated notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification request failed: {0}")]
    Http(String),

    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to encode template data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
