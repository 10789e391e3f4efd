//! Settings and stores shared by the commands that reach a store

use std::path::{Path, PathBuf};

use tracing::debug;

use confsync_core::{ClientSet, Reconciler, ReconcilerOptions};
use confsync_meta::{DEFAULT_SETTINGS_FILE, DefinitionStore, Settings};

use crate::error::Result;

/// Loaded settings plus a reconciler over every configured instance.
pub struct Context {
    pub settings: Settings,
    pub reconciler: Reconciler,
    pub definitions: DefinitionStore,
}

impl Context {
    /// Load `config`, or `confsync.toml` in the working directory.
    ///
    /// Store paths are resolved against the directory holding the settings.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let path = match config {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?.join(DEFAULT_SETTINGS_FILE),
        };
        let settings = Settings::load(&path)?;
        let base_dir = settings_dir(&path);

        let clients = ClientSet::from_settings(&settings, &base_dir)?;
        let options = ReconcilerOptions::from(&settings.reconcile);
        debug!(
            settings = %path.display(),
            strategy = %options.write_mode,
            delete_mode = %options.delete_mode,
            "loaded settings"
        );

        Ok(Self {
            reconciler: Reconciler::new(clients, options),
            settings,
            definitions: DefinitionStore::new(),
        })
    }
}

fn settings_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
