//! Remote configuration store client for confsync
//!
//! Provides the [`RemoteClient`] interface the reconciliation engine talks
//! to, together with the request/response and error types it exchanges:
//!
//! - **RemoteClient**: get / merge-patch / replace-put / post / delete / YANG-Patch
//!   keyed by hierarchical RESTCONF paths
//! - **YangPatch**: ordered edit lists applied as one transaction
//! - **MemoryStore**: an in-process RESTCONF store with merge, rollback and
//!   dry-run semantics
//! - **FileStore**: a `MemoryStore` persisted to a JSON file

pub mod client;
pub mod error;
pub mod file;
pub mod memory;
pub mod response;
pub mod yang_patch;

pub use client::RemoteClient;
pub use error::{ClientError, Method, RestconfError, Result};
pub use file::FileStore;
pub use memory::{MemoryStore, StoreSnapshot};
pub use response::Response;
pub use yang_patch::{EditOperation, YangPatch, YangPatchEdit};
