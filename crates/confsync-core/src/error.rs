//! Error types for confsync-core

use confsync_client::ClientError;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling a node
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node names an instance the client set does not know
    #[error("Invalid instance: {instance:?} is not configured")]
    InvalidInstance { instance: String },

    /// A remote call failed
    #[error("{operation} of {path} failed: {source}")]
    Remote {
        path: String,
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    /// A node id or path suffix cannot be resolved
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A node root name that is not one of the known anchors
    #[error("Invalid root {value:?}: expected device-config, device or device-group")]
    InvalidRoot { value: String },

    /// The store has no rollback file with this id
    #[error("Rollback {id} not found")]
    RollbackNotFound { id: u64 },

    /// Building or reading a value tree failed
    #[error(transparent)]
    Value(#[from] confsync_value::Error),

    /// Settings error from confsync-meta
    #[error(transparent)]
    Meta(#[from] confsync_meta::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn remote(path: impl Into<String>, operation: &'static str, source: ClientError) -> Self {
        Self::Remote {
            path: path.into(),
            operation,
            source,
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The underlying client error, if this is a remote failure.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Error::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}
