//! Error types for confsync-value

/// Result type for confsync-value operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or writing value paths
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid path expression `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Cannot set `{path}`: {reason}")]
    PathSetFailed { path: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn set_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathSetFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
