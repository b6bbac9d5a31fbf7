//! Error types for the mesh node registry
//!
//! Provides structured error types for the registry core and the
//! decoded-update replay tooling built on top of it.

use crate::domain::ValidationError;
use thiserror::Error;

/// Unified error type for the registry
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Registry Errors
    // =========================================================================
    /// A record built from a partial update failed validation
    #[error("Invalid node data in {operation}: {source}")]
    InvalidNodeData {
        operation: &'static str,
        #[source]
        source: ValidationError,
    },

    // =========================================================================
    // Replay Errors
    // =========================================================================
    #[error("Malformed update on line {line}: {source}")]
    UpdateParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an `InvalidNodeData` error for the named operation
    pub fn invalid_node_data(operation: &'static str, source: ValidationError) -> Self {
        Error::InvalidNodeData { operation, source }
    }

    /// Name of the registry operation that failed, if any
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Error::InvalidNodeData { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Check if retrying the same input could succeed
    ///
    /// Bad data stays bad; only IO is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

/// Result type alias for the registry
pub type Result<T> = std::result::Result<T, Error>;
