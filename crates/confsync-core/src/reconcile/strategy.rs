//! Write strategies
//!
//! A strategy writes a node's body and removes the paths delete detection
//! found, or tears a node down path by path. [`SequentialWriter`] issues one
//! request per step; [`TransactionalWriter`] folds everything into a single
//! YANG-Patch.

use serde_json::Value;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use confsync_client::{ClientError, RemoteClient, YangPatch};

use crate::error::{Error, Result};
use crate::node::ConfigNode;

/// Error message a merge-write returns when its target does not exist.
pub const NONEXISTENT_TARGET: &str = "patch to a nonexistent resource";

/// Whether `err` reports a merge-write against a target that does not exist.
///
/// This is the only failure that makes a write fall back to a replace-write
/// at the full path.
pub fn is_nonexistent_target(err: &ClientError) -> bool {
    err.error_message() == Some(NONEXISTENT_TARGET)
}

/// How a node's desired state reaches the store
pub trait WriteStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Write `body` for `node`, then remove every path in `deletions`.
    fn write(
        &self,
        client: &dyn RemoteClient,
        node: &ConfigNode,
        body: &Value,
        deletions: &[String],
    ) -> Result<()>;

    /// Remove every path in `paths`. Paths already gone are not an error.
    fn remove(&self, client: &dyn RemoteClient, paths: &[String]) -> Result<()>;
}

/// PATCH the short path, falling back to PUT at the full path, then DELETE
/// each removed item.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialWriter;

impl SequentialWriter {
    fn merge_write(&self, client: &dyn RemoteClient, node: &ConfigNode, body: &Value) -> Result<()> {
        let short = node.short_path();
        match client.patch(&short, body) {
            Ok(_) => Ok(()),
            Err(e) if is_nonexistent_target(&e) => {
                let path = node.path();
                debug!(%path, "merge target missing, replacing at full path");
                client
                    .put(&path, body)
                    .map(|_| ())
                    .map_err(|e| Error::remote(path, "replace", e))
            }
            Err(e) => Err(Error::remote(short, "merge", e)),
        }
    }
}

/// DELETE `path`, treating `404` as already deleted.
pub(crate) fn delete_tolerating(client: &dyn RemoteClient, path: &str, tolerated: &[u16]) -> Result<()> {
    match client.delete(path) {
        Ok(_) => Ok(()),
        Err(e) if e.status_code().is_some_and(|s| tolerated.contains(&s)) => {
            warn!(path, status = ?e.status_code(), "delete tolerated");
            Ok(())
        }
        Err(e) => Err(Error::remote(path, "delete", e)),
    }
}

impl WriteStrategy for SequentialWriter {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn write(
        &self,
        client: &dyn RemoteClient,
        node: &ConfigNode,
        body: &Value,
        deletions: &[String],
    ) -> Result<()> {
        self.merge_write(client, node, body)?;
        self.remove(client, deletions)
    }

    fn remove(&self, client: &dyn RemoteClient, paths: &[String]) -> Result<()> {
        for path in paths {
            delete_tolerating(client, path, &[404])?;
        }
        Ok(())
    }
}

/// One YANG-Patch: a merge of the body at the full path plus a remove per
/// deletion. The store applies all edits or none.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionalWriter;

impl WriteStrategy for TransactionalWriter {
    fn name(&self) -> &'static str {
        "yang-patch"
    }

    fn write(
        &self,
        client: &dyn RemoteClient,
        node: &ConfigNode,
        body: &Value,
        deletions: &[String],
    ) -> Result<()> {
        let path = node.path();
        let mut patch = YangPatch::new(Uuid::new_v4().to_string())
            .with_comment(format!("confsync {}", path));
        patch.merge(path.clone(), body.clone());
        for deletion in deletions {
            patch.remove(deletion.clone());
        }
        trace!(patch = %patch.to_body(), "sending yang-patch");

        client
            .yang_patch(&patch)
            .map(|_| ())
            .map_err(|e| Error::remote(path, "yang-patch", e))
    }

    fn remove(&self, client: &dyn RemoteClient, paths: &[String]) -> Result<()> {
        let Some(first) = paths.first() else {
            return Ok(());
        };
        let mut patch = YangPatch::new(Uuid::new_v4().to_string())
            .with_comment(format!("confsync remove {}", first));
        for path in paths {
            patch.remove(path.clone());
        }
        trace!(patch = %patch.to_body(), "sending yang-patch");

        client
            .yang_patch(&patch)
            .map(|_| ())
            .map_err(|e| Error::remote(first.clone(), "yang-patch", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsync_client::{Method, RestconfError};

    // The fallback hinges on the store's exact wording. If the store ever
    // rephrases this message, creates against missing parents start failing.
    #[test]
    fn test_nonexistent_target_literal() {
        let err = ClientError::status(
            Method::Patch,
            "x",
            404,
            RestconfError::application("invalid-value", "patch to a nonexistent resource"),
        );
        assert!(is_nonexistent_target(&err));
    }

    #[test]
    fn test_other_messages_do_not_match() {
        for message in [
            "Patch to a nonexistent resource",
            "patch to a nonexistent resource.",
            "uri keypath not found",
        ] {
            let err = ClientError::status(
                Method::Patch,
                "x",
                404,
                RestconfError::application("invalid-value", message),
            );
            assert!(!is_nonexistent_target(&err), "{message}");
        }
        assert!(!is_nonexistent_target(&ClientError::transport(
            Method::Patch,
            "x",
            "patch to a nonexistent resource"
        )));
    }
}
