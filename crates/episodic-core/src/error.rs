use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while deciding on or importing a media file.
#[derive(Debug, Error)]
pub enum EpisodicError {
    /// The input string is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// A filesystem operation failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The SQLite catalog rejected a query or write.
    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON (config or probe output) could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The runtime prober could not determine a duration.
    #[error("runtime probe failed for {path:?}: {reason}")]
    Probe {
        /// The probed file.
        path: PathBuf,
        /// Why probing failed.
        reason: String,
    },

    /// The quality table is malformed (duplicate or missing levels).
    #[error("invalid quality table: {0}")]
    InvalidQualityTable(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The catalog refused an operation or returned inconsistent data.
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl EpisodicError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for episodic operations.
pub type Result<T> = std::result::Result<T, EpisodicError>;
