//! `confsync.toml` settings
//!
//! ```toml
//! default_instance = "lab"
//!
//! [reconcile]
//! strategy = "sequential"   # or "yang-patch"
//! delete_mode = "all"       # or "paths"
//!
//! [instances.lab]
//! store = "stores/lab.json"
//!
//! [instances.lab.list_keys]
//! rule = "id"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name looked up when no settings path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "confsync.toml";

/// How desired state is written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Merge-patch the body, then delete removed items one request at a time
    #[default]
    Sequential,
    /// Send the body and all removals as one YANG-Patch transaction
    YangPatch,
}

impl FromStr for WriteMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(WriteMode::Sequential),
            "yang-patch" | "yangpatch" | "transactional" => Ok(WriteMode::YangPatch),
            _ => Err(Error::InvalidSetting {
                setting: "strategy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Sequential => write!(f, "sequential"),
            WriteMode::YangPatch => write!(f, "yang-patch"),
        }
    }
}

/// What destroying a node removes from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteMode {
    /// Delete the node's path in one request
    #[default]
    All,
    /// Delete only the leaves, list entries and leaf-list values the node manages
    Paths,
}

impl FromStr for DeleteMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(DeleteMode::All),
            "paths" => Ok(DeleteMode::Paths),
            _ => Err(Error::InvalidSetting {
                setting: "delete_mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteMode::All => write!(f, "all"),
            DeleteMode::Paths => write!(f, "paths"),
        }
    }
}

/// `[reconcile]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileSettings {
    #[serde(default)]
    pub strategy: WriteMode,
    #[serde(default)]
    pub delete_mode: DeleteMode,
}

/// `[instances.<name>]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSettings {
    /// JSON file backing the store, relative to the settings file
    pub store: PathBuf,
    /// Key field per list name, used to match list entries in the store
    #[serde(default)]
    pub list_keys: BTreeMap<String, String>,
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Instance used by nodes that do not name one
    #[serde(default)]
    pub default_instance: Option<String>,
    #[serde(default)]
    pub reconcile: ReconcileSettings,
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceSettings>,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            format: "TOML".into(),
            message: e.to_string(),
        })
    }

    /// Load settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "TOML".into(),
            message: e.to_string(),
        })
    }

    /// Name of the instance a node without an explicit instance maps to.
    pub fn default_instance_name(&self) -> &str {
        self.default_instance.as_deref().unwrap_or("")
    }

    /// Settings of instance `name`.
    pub fn instance(&self, name: &str) -> Result<&InstanceSettings> {
        self.instances.get(name).ok_or_else(|| Error::UnknownInstance {
            name: name.to_string(),
        })
    }

    /// Store file of instance `name`, resolved against `base_dir`.
    pub fn store_path(&self, base_dir: &Path, name: &str) -> Result<PathBuf> {
        let instance = self.instance(name)?;
        Ok(if instance.store.is_absolute() {
            instance.store.clone()
        } else {
            base_dir.join(&instance.store)
        })
    }
}
