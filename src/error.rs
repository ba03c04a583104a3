//! Unified error hierarchy for CoachRS
//!
//! Structured error types with context preservation and integration with
//! the tracing system.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all CoachRS operations
#[derive(Debug, Error)]
pub enum CoachError {
    /// Snapshot loading errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors loading the engine's input snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Snapshot contents fail structural checks
    #[error("Invalid snapshot: {reason}")]
    Invalid { reason: String },

    /// A referenced record is missing
    #[error("Missing record: {kind}.{id}")]
    MissingRecord { kind: String, id: String },
}

/// Result type alias for CoachRS operations
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoachError::Snapshot(SnapshotError::FileNotFound { .. }) => ErrorSeverity::Warning,
            CoachError::Validation(_) => ErrorSeverity::Warning,
            CoachError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CoachError::Snapshot(SnapshotError::FileNotFound { path }) => {
                format!("Could not find snapshot file: {}", path.display())
            }
            CoachError::Snapshot(SnapshotError::Invalid { reason }) => {
                format!("Snapshot file is invalid: {}", reason)
            }
            CoachError::Configuration(reason) => {
                format!("Configuration problem: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = CoachError::Snapshot(SnapshotError::FileNotFound {
            path: PathBuf::from("/test/snapshot.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = CoachError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_messages() {
        let err = CoachError::Snapshot(SnapshotError::FileNotFound {
            path: PathBuf::from("snapshot.json"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err = CoachError::Validation("soreness out of range".to_string());
        assert!(err.user_message().contains("soreness"));
    }
}
