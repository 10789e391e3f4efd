//! Remote configuration store client interface

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::response::Response;
use crate::yang_patch::YangPatch;

/// Path-addressed access to a remote configuration store.
///
/// Paths are RESTCONF data resource paths relative to the datastore root
/// (`tailf-ncs:devices/device=ce0/config`). Write paths may carry a query
/// string (`tailf-ncs:devices?dry-run=cli`).
///
/// Implementations must report a missing resource as
/// [`ClientError::Status`](crate::ClientError::Status) with status 404 so
/// callers can treat absence as a valid state.
pub trait RemoteClient: Send + Sync {
    /// Read the resource at `path`.
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response>;

    /// Merge `body` into the resource at `path`. Never removes data.
    fn patch(&self, path: &str, body: &Value) -> Result<Response>;

    /// Replace the resource at `path` with `body`, creating it if needed.
    fn put(&self, path: &str, body: &Value) -> Result<Response>;

    /// Create a child resource or invoke an action at `path`.
    fn post(&self, path: &str, body: &Value) -> Result<Response>;

    /// Delete the resource at `path`.
    fn delete(&self, path: &str) -> Result<Response>;

    /// Apply all edits of `patch` atomically.
    fn yang_patch(&self, patch: &YangPatch) -> Result<Response>;
}

impl<T: RemoteClient + ?Sized> RemoteClient for Arc<T> {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        (**self).get(path, query)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Response> {
        (**self).patch(path, body)
    }

    fn put(&self, path: &str, body: &Value) -> Result<Response> {
        (**self).put(path, body)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Response> {
        (**self).post(path, body)
    }

    fn delete(&self, path: &str) -> Result<Response> {
        (**self).delete(path)
    }

    fn yang_patch(&self, patch: &YangPatch) -> Result<Response> {
        (**self).yang_patch(patch)
    }
}
