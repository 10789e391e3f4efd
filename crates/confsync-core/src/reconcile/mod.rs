//! Reconciliation of nodes against a remote store
//!
//! The [`Reconciler`] drives one node at a time through the lifecycle:
//!
//! - **create**: build the body and write it; the node's id becomes its path
//! - **read**: read the node's path and refresh it; an absent resource reads
//!   back as an empty node
//! - **update**: write the plan, then remove what the plan dropped
//! - **delete**: remove the node's configuration, unless it opted out
//!
//! Remote calls within an operation are strictly sequential and nothing is
//! retried. A failure part way through an update leaves earlier deletions in
//! place.

mod clients;
mod strategy;

pub use clients::ClientSet;
pub use strategy::{
    NONEXISTENT_TARGET, SequentialWriter, TransactionalWriter, WriteStrategy,
    is_nonexistent_target,
};

use confsync_client::RemoteClient;
use confsync_meta::{DeleteMode, ReconcileSettings, WriteMode};
use tracing::debug;

use crate::body::build_body;
use crate::diff::{delete_paths, detect_deletions};
use crate::error::{Error, Result};
use crate::extract::{apply_response, extract_all};
use crate::node::{Attributes, ConfigNode};
use crate::path::{NodeAddress, parse_node_path};

use strategy::delete_tolerating;

/// Query sent with every read.
const CONFIG_CONTENT: [(&str, &str); 1] = [("content", "config")];

/// Construction-time choices of a [`Reconciler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilerOptions {
    pub write_mode: WriteMode,
    pub delete_mode: DeleteMode,
}

impl From<&ReconcileSettings> for ReconcilerOptions {
    fn from(settings: &ReconcileSettings) -> Self {
        Self {
            write_mode: settings.strategy,
            delete_mode: settings.delete_mode,
        }
    }
}

/// Drives nodes through create / read / update / delete.
pub struct Reconciler {
    clients: ClientSet,
    writer: Box<dyn WriteStrategy>,
    delete_mode: DeleteMode,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("clients", &self.clients)
            .field("writer", &self.writer.name())
            .field("delete_mode", &self.delete_mode)
            .finish()
    }
}

impl Reconciler {
    pub fn new(clients: ClientSet, options: ReconcilerOptions) -> Self {
        let writer: Box<dyn WriteStrategy> = match options.write_mode {
            WriteMode::Sequential => Box::new(SequentialWriter),
            WriteMode::YangPatch => Box::new(TransactionalWriter),
        };
        Self::with_writer(clients, writer, options.delete_mode)
    }

    /// Use a custom write strategy.
    pub fn with_writer(
        clients: ClientSet,
        writer: Box<dyn WriteStrategy>,
        delete_mode: DeleteMode,
    ) -> Self {
        Self {
            clients,
            writer,
            delete_mode,
        }
    }

    pub fn clients(&self) -> &ClientSet {
        &self.clients
    }

    /// Create the node's configuration. Returns the node with its id set.
    pub fn create(&self, plan: &ConfigNode) -> Result<ConfigNode> {
        let client = self.clients.get(plan.instance_name())?;
        let path = plan.path();
        debug!(%path, writer = self.writer.name(), "beginning create");

        let body = build_body(plan)?;
        self.writer.write(client, plan, &body, &[])?;

        let mut state = plan.clone();
        state.id = Some(path.clone());
        debug!(%path, "create finished");
        Ok(state)
    }

    /// Refresh `state` from the store.
    pub fn read(&self, state: &ConfigNode) -> Result<ConfigNode> {
        let client = self.clients.get(state.instance_name())?;
        let path = state.path();
        debug!(%path, "beginning read");

        let mut refreshed = state.clone();
        match client.get(&path, &CONFIG_CONTENT) {
            Ok(res) => apply_response(&mut refreshed, &res.body),
            Err(e) if e.is_not_found() => {
                debug!(%path, "not found, resetting to empty");
                refreshed.clear_observed();
            }
            Err(e) => return Err(Error::remote(path, "read", e)),
        }

        debug!(path = %state.path(), "read finished");
        Ok(refreshed)
    }

    /// Write `plan` and delete what it dropped relative to `prior`.
    ///
    /// Dropped items live where `prior` put them, so they are removed through
    /// the prior node's instance.
    pub fn update(&self, plan: &ConfigNode, prior: &ConfigNode) -> Result<ConfigNode> {
        let client = self.clients.get(plan.instance_name())?;
        let prior_client = self.clients.get(prior.instance_name())?;
        let path = plan.path();
        debug!(%path, writer = self.writer.name(), "beginning update");

        let body = build_body(plan)?;
        let deletions = detect_deletions(plan, prior);
        if plan.instance_name() == prior.instance_name() {
            self.writer.write(client, plan, &body, &deletions)?;
        } else {
            debug!(%path, from = prior.instance_name(), "instance changed, removing through prior instance");
            self.writer.write(client, plan, &body, &[])?;
            self.writer.remove(prior_client, &deletions)?;
        }

        let mut state = plan.clone();
        state.id = Some(path.clone());
        debug!(%path, deleted = deletions.len(), "update finished");
        Ok(state)
    }

    /// Remove the node's configuration from the store.
    ///
    /// Nodes with `delete` unset are left in place.
    pub fn delete(&self, state: &ConfigNode) -> Result<()> {
        let client = self.clients.get(state.instance_name())?;
        let path = state.path();
        debug!(%path, mode = %self.delete_mode, "beginning delete");

        if !state.delete {
            debug!(%path, "delete disabled, leaving remote configuration");
            return Ok(());
        }

        match self.delete_mode {
            DeleteMode::All => delete_tolerating(client, &path, &[404, 400])?,
            DeleteMode::Paths => {
                let paths = delete_paths(state);
                debug!(%path, ?paths, "paths to delete");
                self.writer.remove(client, &paths)?;
            }
        }

        debug!(%path, "delete finished");
        Ok(())
    }

    /// Build a node for an existing path, as produced by [`ConfigNode::path`].
    pub fn import(&self, id: &str, instance: Option<&str>) -> Result<ConfigNode> {
        self.clients.get(instance.unwrap_or(""))?;
        let address = parse_node_path(id)?;
        debug!(%id, root = %address.root, name = %address.name, "importing");

        let mut node = ConfigNode::new(address.name).with_root(address.root);
        node.instance = instance.map(str::to_string);
        node.path = address.suffix;
        node.id = Some(node.path());
        Ok(node)
    }

    /// Every scalar member at `address`, without tracking any node.
    pub fn fetch(&self, instance: Option<&str>, address: &NodeAddress) -> Result<Attributes> {
        let client = self.clients.get(instance.unwrap_or(""))?;
        let path = address.path();
        debug!(%path, "beginning fetch");

        match client.get(&path, &CONFIG_CONTENT) {
            Ok(res) => Ok(extract_all(&path, &res.body)),
            Err(e) if e.is_not_found() => Ok(Attributes::new()),
            Err(e) => Err(Error::remote(path, "fetch", e)),
        }
    }

    /// Client of `instance`, for actions outside the node lifecycle.
    pub fn client(&self, instance: Option<&str>) -> Result<&dyn RemoteClient> {
        self.clients.get(instance.unwrap_or(""))
    }
}
