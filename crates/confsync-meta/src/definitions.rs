//! Format-agnostic definition loading and saving

use std::fs;
use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{Error, Result};

/// Largest definition file accepted by [`DefinitionStore::load`].
pub const MAX_DEFINITION_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "toml" => Ok(Format::Toml),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Format::Toml => "TOML",
            Format::Json => "JSON",
            Format::Yaml => "YAML",
        }
    }
}

/// Loads and saves definition files, detecting the format from the extension:
///
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - `.yaml`, `.yml` -> YAML
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    max_size: u64,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            max_size: MAX_DEFINITION_SIZE,
        }
    }

    /// Use a different size limit.
    pub fn with_max_size(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Load a definition from `path`.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let format = Format::detect(path)?;
        let metadata = fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::io(path, e)
            }
        })?;
        if metadata.len() > self.max_size {
            return Err(Error::ConfigTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max: self.max_size,
            });
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), format = format.name(), "loading definition");

        let parse_error = |message: String| Error::ConfigParse {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        };
        match format {
            Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
            Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
            Format::Yaml => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Save `value` to `path` in the format named by its extension.
    ///
    /// The file is written next to its destination and renamed into place.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let format = Format::detect(path)?;
        let serialize_error = |message: String| Error::ConfigSerialize {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        };
        let mut content = match format {
            Format::Toml => toml::to_string_pretty(value).map_err(|e| serialize_error(e.to_string()))?,
            Format::Json => {
                serde_json::to_string_pretty(value).map_err(|e| serialize_error(e.to_string()))?
            }
            Format::Yaml => serde_yaml::to_string(value).map_err(|e| serialize_error(e.to_string()))?,
        };
        if !content.ends_with('\n') {
            content.push('\n');
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let temp_path = path.with_extension(format!("{}.tmp", std::process::id()));
        fs::write(&temp_path, content).map_err(|e| Error::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
        Ok(())
    }
}
