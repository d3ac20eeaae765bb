//! Error types for the library layer.

use std::fmt;

/// Errors produced by the library layer, wrapping download errors and
/// adding CSV parsing, serialization, and input validation failures.
#[derive(Debug)]
pub enum HistoryError {
    /// An error from the underlying download client.
    Api(yahoo_history_api::Error),
    /// A well-formed CSV record held a value that could not be parsed.
    Parse { line: u64, reason: String },
    /// User-provided input failed validation.
    InvalidInput(String),
    /// JSON serialization failed.
    Serialization(serde_json::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Parse { line, reason } => write!(f, "Parse error on line {}: {}", line, reason),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<yahoo_history_api::Error> for HistoryError {
    fn from(e: yahoo_history_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
