//! Instance name to client mapping

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use confsync_client::{FileStore, RemoteClient};
use confsync_meta::Settings;

use crate::error::{Error, Result};

/// Clients keyed by instance name. The empty name is the default instance.
#[derive(Clone, Default)]
pub struct ClientSet {
    clients: BTreeMap<String, Arc<dyn RemoteClient>>,
}

impl fmt::Debug for ClientSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSet")
            .field("instances", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ClientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding `client` as the default instance.
    pub fn single(client: Arc<dyn RemoteClient>) -> Self {
        Self::new().with_client("", client)
    }

    pub fn with_client(mut self, name: impl Into<String>, client: Arc<dyn RemoteClient>) -> Self {
        self.insert(name, client);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, client: Arc<dyn RemoteClient>) {
        self.clients.insert(name.into(), client);
    }

    /// Client for `instance`, failing before any remote call if unknown.
    pub fn get(&self, instance: &str) -> Result<&dyn RemoteClient> {
        self.clients
            .get(instance)
            .map(|c| c.as_ref())
            .ok_or_else(|| Error::InvalidInstance {
                instance: instance.to_string(),
            })
    }

    pub fn contains(&self, instance: &str) -> bool {
        self.clients.contains_key(instance)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    /// Open a [`FileStore`] per configured instance.
    ///
    /// Store paths are resolved against `base_dir`. The default instance, if
    /// set, is also reachable under the empty name.
    pub fn from_settings(settings: &Settings, base_dir: &Path) -> Result<Self> {
        let mut set = Self::new();
        for (name, instance) in &settings.instances {
            let store_path = settings.store_path(base_dir, name)?;
            let store = FileStore::open(&store_path)
                .map_err(|e| Error::remote(store_path.display().to_string(), "open", e))?
                .with_list_keys(instance.list_keys.clone());
            debug!(instance = %name, store = %store_path.display(), "opened instance");
            set.insert(name.clone(), Arc::new(store));
        }

        if let Some(default) = settings.default_instance.as_deref()
            && !default.is_empty()
        {
            let client = set
                .clients
                .get(default)
                .cloned()
                .ok_or_else(|| Error::InvalidInstance {
                    instance: default.to_string(),
                })?;
            set.insert("", client);
        }
        Ok(set)
    }
}
