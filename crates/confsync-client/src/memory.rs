//! In-memory RESTCONF store
//!
//! `MemoryStore` keeps a configuration tree in process and answers the
//! [`RemoteClient`] operations with the semantics of a RESTCONF datastore:
//!
//! - `list=key` path segments select keyed list entries (or leaf-list values)
//! - GET of a list entry returns it wrapped in a one-element array
//! - PATCH merges and never removes list entries; patching a missing target
//!   fails with `patch to a nonexistent resource`, merging an entry into a
//!   list without giving its key fails with `400`
//! - PUT replaces, creating the target and its ancestors
//! - YANG-Patch applies all edits to a copy and commits only if every edit
//!   succeeds
//! - `?dry-run=<format>` reports the change as a line diff without applying it
//! - `?rollback-id=true` records a pre-image that `apply-rollback-file`
//!   restores

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use similar::{ChangeTag, TextDiff};
use tracing::{debug, trace};

use confsync_value::to_scalar_string;

use crate::client::RemoteClient;
use crate::error::{ClientError, Method, RestconfError, Result};
use crate::response::Response;
use crate::yang_patch::{EditOperation, YangPatch};

const NONEXISTENT_PATCH: &str = "patch to a nonexistent resource";
const KEYPATH_NOT_FOUND: &str = "uri keypath not found";
const ROLLBACK_ACTION: &str = "apply-rollback-file";

/// Persistable state of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// The configuration tree
    #[serde(default)]
    pub data: Value,
    /// Pre-images recorded by commits, keyed by rollback id
    #[serde(default)]
    pub rollbacks: BTreeMap<u64, Value>,
    /// Last rollback id handed out
    #[serde(default)]
    pub next_rollback_id: u64,
}

impl StoreSnapshot {
    fn record_rollback(&mut self) -> u64 {
        self.next_rollback_id += 1;
        let id = self.next_rollback_id;
        self.rollbacks.insert(id, self.data.clone());
        id
    }
}

#[derive(Debug, Clone)]
struct Segment {
    name: String,
    selector: Option<String>,
}

fn parse_segments(resource: &str) -> Vec<Segment> {
    resource
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|raw| match raw.split_once('=') {
            Some((name, key)) => Segment {
                name: name.to_string(),
                selector: Some(
                    urlencoding::decode(key)
                        .map(|k| k.into_owned())
                        .unwrap_or_else(|_| key.to_string()),
                ),
            },
            None => Segment {
                name: raw.to_string(),
                selector: None,
            },
        })
        .collect()
}

fn split_query(path: &str) -> (&str, Vec<(String, String)>) {
    match path.split_once('?') {
        Some((resource, query)) => {
            let params = query
                .split('&')
                .filter(|p| !p.is_empty())
                .map(|p| match p.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (p.to_string(), String::new()),
                })
                .collect();
            (resource, params)
        }
        None => (path, Vec::new()),
    }
}

/// An in-process configuration store speaking RESTCONF semantics.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<StoreSnapshot>,
    list_keys: HashMap<String, String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_tree(Value::Object(Map::new()))
    }

    /// Create a store holding `tree`.
    pub fn from_tree(tree: Value) -> Self {
        Self::from_snapshot(StoreSnapshot {
            data: tree,
            ..StoreSnapshot::default()
        })
    }

    /// Restore a store from a snapshot.
    pub fn from_snapshot(mut snapshot: StoreSnapshot) -> Self {
        if snapshot.data.is_null() {
            snapshot.data = Value::Object(Map::new());
        }
        Self {
            state: Mutex::new(snapshot),
            list_keys: HashMap::new(),
        }
    }

    /// Declare the key field of list `list`.
    ///
    /// Without a declaration, entries are identified by their `name` member.
    pub fn with_list_key(mut self, list: impl Into<String>, field: impl Into<String>) -> Self {
        self.list_keys.insert(list.into(), field.into());
        self
    }

    /// Declare several list key fields at once.
    pub fn with_list_keys<I, K, V>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (list, field) in keys {
            self.list_keys.insert(list.into(), field.into());
        }
        self
    }

    /// Copy of the current configuration tree.
    pub fn tree(&self) -> Value {
        self.snapshot().data
    }

    /// Copy of the full store state.
    pub fn snapshot(&self) -> StoreSnapshot {
        match self.state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Put back a state taken with [`MemoryStore::snapshot`].
    pub(crate) fn restore(&self, snapshot: StoreSnapshot) {
        match self.state.lock() {
            Ok(mut state) => *state = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    fn lock(&self, method: Method, path: &str) -> Result<MutexGuard<'_, StoreSnapshot>> {
        self.state
            .lock()
            .map_err(|_| ClientError::transport(method, path, "store lock poisoned"))
    }

    fn key_field(&self, list: &str) -> &str {
        self.list_keys.get(list).map(String::as_str).unwrap_or("name")
    }

    fn entry_key(&self, list: &str, entry: &Value) -> Option<String> {
        match entry {
            Value::Object(map) => {
                map.get(self.key_field(list)).map(to_scalar_string)
            }
            Value::Array(_) => None,
            scalar => Some(to_scalar_string(scalar)),
        }
    }

    fn matches(&self, list: &str, entry: &Value, key: &str) -> bool {
        self.entry_key(list, entry).as_deref() == Some(key)
    }

    fn find<'a>(&self, root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
        segments.iter().try_fold(root, |node, seg| {
            let child = node.as_object()?.get(&seg.name)?;
            match &seg.selector {
                None => Some(child),
                Some(key) => child
                    .as_array()?
                    .iter()
                    .find(|entry| self.matches(&seg.name, entry, key)),
            }
        })
    }

    fn find_mut<'a>(
        &self,
        root: &'a mut Value,
        segments: &[Segment],
        create: bool,
    ) -> Option<&'a mut Value> {
        let mut node = root;
        for seg in segments {
            node = self.child_mut(node, seg, create)?;
        }
        Some(node)
    }

    fn child_mut<'a>(
        &self,
        node: &'a mut Value,
        seg: &Segment,
        create: bool,
    ) -> Option<&'a mut Value> {
        if create && node.is_null() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut()?;
        if create && !map.contains_key(&seg.name) {
            let fresh = match seg.selector {
                Some(_) => Value::Array(Vec::new()),
                None => Value::Object(Map::new()),
            };
            map.insert(seg.name.clone(), fresh);
        }

        let child = map.get_mut(&seg.name)?;
        let Some(key) = &seg.selector else {
            return Some(child);
        };

        let list = child.as_array_mut()?;
        let pos = match list
            .iter()
            .position(|entry| self.matches(&seg.name, entry, key))
        {
            Some(pos) => pos,
            None if create => {
                let mut entry = Map::new();
                entry.insert(
                    self.key_field(&seg.name).to_string(),
                    Value::String(key.clone()),
                );
                list.push(Value::Object(entry));
                list.len() - 1
            }
            None => return None,
        };
        Some(&mut list[pos])
    }

    fn remove(&self, root: &mut Value, segments: &[Segment]) -> Option<Value> {
        let (last, parents) = segments.split_last()?;
        let parent = self.find_mut(root, parents, false)?;
        let map = parent.as_object_mut()?;
        match &last.selector {
            None => map.remove(&last.name),
            Some(key) => {
                let list = map.get_mut(&last.name)?.as_array_mut()?;
                let pos = list
                    .iter()
                    .position(|entry| self.matches(&last.name, entry, key))?;
                Some(list.remove(pos))
            }
        }
    }

    /// Replace the resource at `segments`, returning whether it was created.
    fn replace(&self, root: &mut Value, segments: &[Segment], content: Value) -> Option<bool> {
        let existed = self.find(root, segments).is_some();
        let slot = self.find_mut(root, segments, true)?;
        *slot = content;

        if let Some(last) = segments.last()
            && let Some(key) = &last.selector
            && slot.is_object()
            && !self.matches(&last.name, slot, key)
            && let Value::Object(map) = slot
        {
            map.insert(
                self.key_field(&last.name).to_string(),
                Value::String(key.clone()),
            );
        }
        Some(!existed)
    }

    fn merge(&self, name: &str, target: &mut Value, incoming: Value) -> std::result::Result<(), UnkeyedEntry> {
        match (target, incoming) {
            (Value::Object(existing), Value::Object(incoming)) => {
                for (key, value) in incoming {
                    match existing.get_mut(&key) {
                        Some(slot) => self.merge(&key, slot, value)?,
                        None => {
                            existing.insert(key, value);
                        }
                    }
                }
            }
            (Value::Array(existing), Value::Array(incoming)) => {
                for entry in incoming {
                    self.merge_entry(name, existing, entry)?;
                }
            }
            (Value::Array(existing), entry @ Value::Object(_)) => {
                self.merge_entry(name, existing, entry)?;
            }
            (target, incoming) => *target = incoming,
        }
        Ok(())
    }

    /// Merge `entry` into the entry with the same key, or append it.
    fn merge_entry(&self, list: &str, entries: &mut Vec<Value>, entry: Value) -> std::result::Result<(), UnkeyedEntry> {
        if !entry.is_object() {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
            return Ok(());
        }

        let Some(key) = self.entry_key(list, &entry) else {
            return Err(UnkeyedEntry {
                list: list.to_string(),
                field: self.key_field(list).to_string(),
            });
        };
        match entries
            .iter_mut()
            .find(|e| e.is_object() && self.entry_key(list, e).as_deref() == Some(key.as_str()))
        {
            Some(existing) => self.merge(list, existing, entry),
            None => {
                entries.push(entry);
                Ok(())
            }
        }
    }

    fn apply_rollback(&self, state: &mut StoreSnapshot, path: &str, body: &Value) -> Result<Response> {
        let malformed = |message: &str| {
            ClientError::status(
                Method::Post,
                path,
                400,
                RestconfError::application("malformed-message", message),
            )
        };

        let input = body
            .get("tailf-rollback:input")
            .or_else(|| body.get("input"))
            .ok_or_else(|| malformed("missing rollback input"))?;
        let id: u64 = input
            .get("fixed-number")
            .map(to_scalar_string)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| malformed("invalid value for fixed-number"))?;

        let Some(pre_image) = state.rollbacks.get(&id).cloned() else {
            return Err(ClientError::status(
                Method::Post,
                path,
                400,
                RestconfError::application(
                    "invalid-value",
                    format!("rollback file {} does not exist", id),
                ),
            ));
        };

        let dry_run = input
            .as_object()
            .and_then(|map| map.iter().find(|(k, _)| k.ends_with("dry-run")))
            .map(|(_, v)| {
                v.get("outformat")
                    .map(to_scalar_string)
                    .unwrap_or_else(|| "cli-c".to_string())
            });

        if let Some(format) = dry_run {
            let diff = render_diff(&state.data, &pre_image);
            return Ok(Response::ok(json!({
                "tailf-rollback:output": result_tree(&format, diff),
            })));
        }

        debug!(rollback = id, "restoring rollback pre-image");
        state.data = pre_image;
        Ok(Response::no_content())
    }
}

/// A list entry merged without the member that identifies it
#[derive(Debug)]
struct UnkeyedEntry {
    list: String,
    field: String,
}

impl UnkeyedEntry {
    fn into_error(self, method: Method, path: &str) -> ClientError {
        ClientError::status(
            method,
            path,
            400,
            RestconfError::application(
                "missing-element",
                format!("entry of list {} has no key member {}", self.list, self.field),
            )
            .at(path),
        )
    }
}

fn body_content(method: Method, path: &str, body: &Value) -> Result<Value> {
    match body.as_object() {
        Some(map) if map.len() == 1 => Ok(map.values().next().cloned().unwrap_or(Value::Null)),
        _ => Err(ClientError::status(
            method,
            path,
            400,
            RestconfError::application(
                "malformed-message",
                "payload must contain exactly one top-level member",
            ),
        )),
    }
}

fn not_found(method: Method, path: &str, message: &str) -> ClientError {
    ClientError::status(
        method,
        path,
        404,
        RestconfError::application("invalid-value", message),
    )
}

/// `{"<format>": {"local-node": {"data": diff}}}`, using `result-xml` for XML.
fn result_tree(format: &str, diff: String) -> Value {
    let key = if format == "xml" { "result-xml" } else { format };
    let mut tree = Map::new();
    tree.insert(key.to_string(), json!({ "local-node": { "data": diff } }));
    Value::Object(tree)
}

/// Line diff between two trees; empty when they are equal.
fn render_diff(before: &Value, after: &Value) -> String {
    if before == after {
        return String::new();
    }
    let old = serde_json::to_string_pretty(before).unwrap_or_default();
    let new = serde_json::to_string_pretty(after).unwrap_or_default();

    let mut out = String::new();
    for change in TextDiff::from_lines(&old, &new).iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => continue,
        };
        out.push(sign);
        out.push_str(change.value().trim_end_matches('\n'));
        out.push('\n');
    }
    out
}

impl RemoteClient for MemoryStore {
    fn get(&self, path: &str, _query: &[(&str, &str)]) -> Result<Response> {
        trace!(path, "memory store GET");
        let (resource, _) = split_query(path);
        let segments = parse_segments(resource);
        let state = self.lock(Method::Get, path)?;

        let Some(last) = segments.last() else {
            return Ok(Response::ok(state.data.clone()));
        };
        let value = self
            .find(&state.data, &segments)
            .ok_or_else(|| not_found(Method::Get, path, KEYPATH_NOT_FOUND))?;

        let wrapped = match last.selector {
            Some(_) => Value::Array(vec![value.clone()]),
            None => value.clone(),
        };
        let mut body = Map::new();
        body.insert(last.name.clone(), wrapped);
        Ok(Response::ok(Value::Object(body)))
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Response> {
        trace!(path, %body, "memory store PATCH");
        let (resource, query) = split_query(path);
        let segments = parse_segments(resource);
        let content = body_content(Method::Patch, path, body)?;
        let mut state = self.lock(Method::Patch, path)?;

        let mut updated = state.data.clone();
        let name = segments.last().map(|s| s.name.clone()).unwrap_or_default();
        let target = self
            .find_mut(&mut updated, &segments, false)
            .ok_or_else(|| not_found(Method::Patch, path, NONEXISTENT_PATCH))?;
        self.merge(&name, target, content)
            .map_err(|e| e.into_error(Method::Patch, path))?;

        if let Some((_, format)) = query.iter().find(|(k, _)| k == "dry-run") {
            let diff = render_diff(&state.data, &updated);
            return Ok(Response::ok(json!({
                "dry-run-result": result_tree(format, diff),
            })));
        }

        let record = query
            .iter()
            .any(|(k, v)| k == "rollback-id" && v != "false");
        let response = if record {
            let id = state.record_rollback();
            Response::ok(json!({"tailf-restconf:result": {"rollback": {"id": id}}}))
        } else {
            Response::no_content()
        };

        state.data = updated;
        Ok(response)
    }

    fn put(&self, path: &str, body: &Value) -> Result<Response> {
        trace!(path, %body, "memory store PUT");
        let (resource, _) = split_query(path);
        let segments = parse_segments(resource);
        let mut state = self.lock(Method::Put, path)?;

        if segments.is_empty() {
            state.data = body.clone();
            return Ok(Response::no_content());
        }

        let content = body_content(Method::Put, path, body)?;
        let created = self
            .replace(&mut state.data, &segments, content)
            .ok_or_else(|| {
                ClientError::status(
                    Method::Put,
                    path,
                    400,
                    RestconfError::application("invalid-value", "path crosses a leaf"),
                )
            })?;

        Ok(if created {
            Response::created()
        } else {
            Response::no_content()
        })
    }

    fn post(&self, path: &str, body: &Value) -> Result<Response> {
        trace!(path, %body, "memory store POST");
        let (resource, _) = split_query(path);
        let segments = parse_segments(resource);
        let mut state = self.lock(Method::Post, path)?;

        if segments.last().is_some_and(|s| s.name == ROLLBACK_ACTION) {
            return self.apply_rollback(&mut state, path, body);
        }

        let Some((name, content)) = body
            .as_object()
            .filter(|m| m.len() == 1)
            .and_then(|m| m.iter().next())
            .map(|(k, v)| (k.clone(), v.clone()))
        else {
            return Err(ClientError::status(
                Method::Post,
                path,
                400,
                RestconfError::application("malformed-message", "payload must contain one member"),
            ));
        };

        let target = self
            .find_mut(&mut state.data, &segments, false)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| not_found(Method::Post, path, KEYPATH_NOT_FOUND))?;
        if target.contains_key(&name) {
            return Err(ClientError::status(
                Method::Post,
                path,
                409,
                RestconfError::application("data-exists", "object already exists").at(&name),
            ));
        }
        target.insert(name, content);
        Ok(Response::created())
    }

    fn delete(&self, path: &str) -> Result<Response> {
        trace!(path, "memory store DELETE");
        let (resource, _) = split_query(path);
        let segments = parse_segments(resource);
        let mut state = self.lock(Method::Delete, path)?;

        if segments.is_empty() {
            return Err(ClientError::status(
                Method::Delete,
                path,
                400,
                RestconfError::application("operation-not-supported", "cannot delete the datastore"),
            ));
        }

        self.remove(&mut state.data, &segments)
            .ok_or_else(|| not_found(Method::Delete, path, KEYPATH_NOT_FOUND))?;
        Ok(Response::no_content())
    }

    fn yang_patch(&self, patch: &YangPatch) -> Result<Response> {
        trace!(patch_id = %patch.patch_id, edits = patch.edits.len(), "memory store YANG-PATCH");
        let mut state = self.lock(Method::YangPatch, "")?;
        let mut updated = state.data.clone();

        for edit in &patch.edits {
            let segments = parse_segments(&edit.target);
            let failed = |status: u16, tag: &str, message: &str| {
                ClientError::status(
                    Method::YangPatch,
                    edit.target.clone(),
                    status,
                    RestconfError::application(tag, format!("edit {}: {}", edit.edit_id, message))
                        .at(&edit.target),
                )
            };
            let content = match (&edit.operation, &edit.value) {
                (EditOperation::Merge | EditOperation::Create | EditOperation::Replace, Some(v)) => {
                    Some(body_content(Method::YangPatch, &edit.target, v)?)
                }
                (EditOperation::Merge | EditOperation::Create | EditOperation::Replace, None) => {
                    return Err(failed(400, "missing-element", "value is required"));
                }
                _ => None,
            };

            match (edit.operation, content) {
                (EditOperation::Merge, Some(content)) => {
                    let name = segments.last().map(|s| s.name.clone()).unwrap_or_default();
                    let slot = self
                        .find_mut(&mut updated, &segments, true)
                        .ok_or_else(|| failed(400, "invalid-value", "path crosses a leaf"))?;
                    self.merge(&name, slot, content)
                        .map_err(|e| e.into_error(Method::YangPatch, &edit.target))?;
                }
                (EditOperation::Create, Some(content)) => {
                    if self.find(&updated, &segments).is_some() {
                        return Err(failed(409, "data-exists", "object already exists"));
                    }
                    self.replace(&mut updated, &segments, content)
                        .ok_or_else(|| failed(400, "invalid-value", "path crosses a leaf"))?;
                }
                (EditOperation::Replace, Some(content)) => {
                    self.replace(&mut updated, &segments, content)
                        .ok_or_else(|| failed(400, "invalid-value", "path crosses a leaf"))?;
                }
                (EditOperation::Delete, _) => {
                    self.remove(&mut updated, &segments)
                        .ok_or_else(|| failed(404, "data-missing", KEYPATH_NOT_FOUND))?;
                }
                (EditOperation::Remove, _) => {
                    self.remove(&mut updated, &segments);
                }
                (_, None) => return Err(failed(400, "missing-element", "value is required")),
            }
        }

        state.data = updated;
        Ok(Response::ok(json!({
            "ietf-yang-patch:yang-patch-status": {
                "patch-id": patch.patch_id,
                "ok": [null],
            }
        })))
    }
}
