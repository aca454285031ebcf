//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Fieldline
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FieldlineError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A guarded operation was refused by the process rules.
    ///
    /// `reasons` carries the ordered, deduplicated blocker list callers are
    /// expected to surface to end users verbatim.
    #[error("{message}")]
    Blocked { message: String, reasons: Vec<String> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FieldlineError {
    /// Build a [`FieldlineError::Blocked`] from a message and reason list.
    pub fn blocked(message: impl Into<String>, reasons: Vec<String>) -> Self {
        Self::Blocked { message: message.into(), reasons }
    }

    /// Blocker reasons attached to this error, if any.
    pub fn blocked_reasons(&self) -> Option<&[String]> {
        match self {
            Self::Blocked { reasons, .. } => Some(reasons),
            _ => None,
        }
    }
}

/// Result type alias for Fieldline operations
pub type Result<T> = std::result::Result<T, FieldlineError>;
