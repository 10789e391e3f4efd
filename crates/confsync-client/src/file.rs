//! File-backed store
//!
//! A [`MemoryStore`] whose state is loaded from and saved to a JSON file.
//! Every successful mutating request rewrites the file atomically. Mutations
//! are serialised: the change and its write to disk happen under one lock,
//! and a change that cannot be written is undone.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::client::RemoteClient;
use crate::error::{ClientError, Method, Result};
use crate::memory::{MemoryStore, StoreSnapshot};
use crate::response::Response;
use crate::yang_patch::YangPatch;

/// A persistent store backed by a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    writes: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| ClientError::io(&path, e))?;
            if content.trim().is_empty() {
                StoreSnapshot::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            StoreSnapshot::default()
        };

        debug!(path = %path.display(), "opened file store");
        Ok(Self {
            path,
            inner: MemoryStore::from_snapshot(snapshot),
            writes: Mutex::new(()),
        })
    }

    /// Declare list key fields, see [`MemoryStore::with_list_key`].
    pub fn with_list_keys<I, K, V>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner = self.inner.with_list_keys(keys);
        self
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current configuration tree.
    pub fn tree(&self) -> Value {
        self.inner.tree()
    }

    /// Run `op` against the in-memory store and write the result to disk.
    ///
    /// Holds the write lock across both steps. When the write fails, the
    /// in-memory state is put back to what it was before `op`.
    fn mutate<F>(&self, method: Method, path: &str, op: F) -> Result<Response>
    where
        F: FnOnce(&MemoryStore) -> Result<Response>,
    {
        let _guard = self
            .writes
            .lock()
            .map_err(|_| ClientError::transport(method, path, "file store lock poisoned"))?;

        let before = self.inner.snapshot();
        let response = op(&self.inner)?;

        let written = serde_json::to_vec_pretty(&self.inner.snapshot())
            .map_err(ClientError::from)
            .and_then(|content| write_atomic(&self.path, &content));
        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "store write failed, undoing change");
            self.inner.restore(before);
            return Err(e);
        }
        Ok(response)
    }
}

/// Write `content` to `path` through a uniquely named, locked temp file in
/// the same directory, then rename it into place.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| ClientError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| ClientError::io(parent, e))?;
    let temp_path = temp.path().to_path_buf();

    temp.as_file()
        .lock_exclusive()
        .map_err(|e| ClientError::io(&temp_path, e))?;
    temp.write_all(content)
        .map_err(|e| ClientError::io(&temp_path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| ClientError::io(&temp_path, e))?;
    FileExt::unlock(temp.as_file()).map_err(|e| ClientError::io(&temp_path, e))?;

    temp.persist(path).map_err(|e| ClientError::io(path, e.error))?;
    Ok(())
}

impl RemoteClient for FileStore {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        self.inner.get(path, query)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Response> {
        // dry-run leaves the tree untouched
        if path.contains("dry-run=") {
            return self.inner.patch(path, body);
        }
        self.mutate(Method::Patch, path, |store| store.patch(path, body))
    }

    fn put(&self, path: &str, body: &Value) -> Result<Response> {
        self.mutate(Method::Put, path, |store| store.put(path, body))
    }

    fn post(&self, path: &str, body: &Value) -> Result<Response> {
        self.mutate(Method::Post, path, |store| store.post(path, body))
    }

    fn delete(&self, path: &str) -> Result<Response> {
        self.mutate(Method::Delete, path, |store| store.delete(path))
    }

    fn yang_patch(&self, patch: &YangPatch) -> Result<Response> {
        self.mutate(Method::YangPatch, "", |store| store.yang_patch(patch))
    }
}
