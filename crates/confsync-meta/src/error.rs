//! Error types for confsync-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse {format} at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported file format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Config file too large: {path} is {size} bytes (max {max})")]
    ConfigTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Unknown instance: {name}")]
    UnknownInstance { name: String },

    #[error("Invalid {setting}: {value}")]
    InvalidSetting { setting: String, value: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
