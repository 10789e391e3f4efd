//! Error types for confsync-client

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result type for remote client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Request method, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Patch,
    Put,
    Post,
    Delete,
    YangPatch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Patch => write!(f, "PATCH"),
            Method::Put => write!(f, "PUT"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
            Method::YangPatch => write!(f, "YANG-PATCH"),
        }
    }
}

/// One entry of a RESTCONF `errors.error` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RestconfError {
    pub error_type: String,
    pub error_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RestconfError {
    /// Application-level error with the given tag and message.
    pub fn application(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: "application".to_string(),
            error_tag: tag.into(),
            error_path: None,
            error_message: Some(message.into()),
        }
    }

    /// Attach the offending data path.
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.error_path = Some(path.into());
        self
    }
}

/// Errors returned by a [`crate::RemoteClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The store answered with a non-success status
    #[error("{method} {path} returned status {status}{}", describe(.errors))]
    Status {
        method: Method,
        path: String,
        status: u16,
        errors: Vec<RestconfError>,
    },

    /// The request never produced a status (connection, lock, encoding)
    #[error("{method} {path} failed: {message}")]
    Transport {
        method: Method,
        path: String,
        message: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe(errors: &[RestconfError]) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|e| e.error_message.as_deref())
        .collect();
    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join("; "))
    }
}

impl ClientError {
    pub fn status(
        method: Method,
        path: impl Into<String>,
        status: u16,
        error: RestconfError,
    ) -> Self {
        Self::Status {
            method,
            path: path.into(),
            status,
            errors: vec![error],
        }
    }

    pub fn transport(method: Method, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            method,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status code, if the store answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message of the first RESTCONF error entry.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { errors, .. } => {
                errors.first().and_then(|e| e.error_message.as_deref())
            }
            _ => None,
        }
    }

    /// Whether the store reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
