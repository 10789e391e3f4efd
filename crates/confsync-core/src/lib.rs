//! Declarative configuration reconciliation for confsync
//!
//! This crate maps a desired configuration node onto a remote RESTCONF-style
//! store and computes the writes and deletes needed to converge it:
//!
//! - **Path resolution**: node identity to store paths, below a device's
//!   config, a device entry or a device group
//! - **Body building**: node to merge-write payload
//! - **State extraction**: read response back into the node's shape
//! - **Delete detection**: list entries and leaf-list values dropped by a plan
//! - **Reconciler**: create / read / update / delete with a pluggable write
//!   strategy
//! - **Transactions**: commit, dry-run and rollback of the device tree
//!
//! # Architecture
//!
//! ```text
//!                  confsync-cli
//!                       |
//!                 confsync-core
//!                       |
//!     +-----------------+----------------+
//!     |                 |                |
//! confsync-value  confsync-client  confsync-meta
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use confsync_client::MemoryStore;
//! use confsync_core::{ClientSet, ConfigNode, Reconciler, ReconcilerOptions};
//!
//! let store = Arc::new(MemoryStore::new());
//! let reconciler = Reconciler::new(ClientSet::single(store), ReconcilerOptions::default());
//!
//! let plan = ConfigNode::new("ce0").with_path("svc").with_attribute("x", "1");
//! let state = reconciler.create(&plan).unwrap();
//! assert_eq!(state.id.as_deref(), Some("tailf-ncs:devices/device=ce0/config/svc"));
//! ```

pub mod body;
pub mod diff;
pub mod error;
pub mod extract;
pub mod node;
pub mod path;
pub mod reconcile;
pub mod transaction;

pub use body::build_body;
pub use diff::{delete_paths, detect_deletions};
pub use error::{Error, Result};
pub use extract::{apply_response, extract_all};
pub use node::{Attributes, ConfigNode, ListEntries, ListItem, ListSpec, NodeRoot};
pub use path::{
    NodeAddress, device_config_path, node_path, parse_node_path, root_key, strip_list_selector,
};
pub use reconcile::{
    ClientSet, NONEXISTENT_TARGET, Reconciler, ReconcilerOptions, SequentialWriter,
    TransactionalWriter, WriteStrategy, is_nonexistent_target,
};
pub use transaction::{ActionOutcome, CommitOutcome, commit, commit_dry_run, rollback, rollback_dry_run};

pub use confsync_meta::{DeleteMode, WriteMode};
