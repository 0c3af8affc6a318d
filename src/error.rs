//! Error types for the order tracker

use thiserror::Error;

/// Order tracker errors
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid schedule '{schedule}': {reason}")]
    Schedule { schedule: String, reason: String },

    #[error("Valuation overflow: {price} x {size}")]
    Valuation {
        price: rust_decimal::Decimal,
        size: rust_decimal::Decimal,
    },

    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<teloxide::RequestError> for TrackerError {
    fn from(err: teloxide::RequestError) -> Self {
        TrackerError::Notification(err.to_string())
    }
}

impl From<prometheus::Error> for TrackerError {
    fn from(err: prometheus::Error) -> Self {
        TrackerError::Metrics(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
