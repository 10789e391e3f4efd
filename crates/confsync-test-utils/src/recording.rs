//! A store that records every call it receives

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use confsync_client::{
    ClientError, MemoryStore, Method, RemoteClient, Response, RestconfError, Result, YangPatch,
};

/// A request received by a [`RecordingClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get { path: String },
    Patch { path: String, body: Value },
    Put { path: String, body: Value },
    Post { path: String, body: Value },
    Delete { path: String },
    YangPatch { patch: YangPatch },
}

impl Call {
    pub fn method(&self) -> Method {
        match self {
            Call::Get { .. } => Method::Get,
            Call::Patch { .. } => Method::Patch,
            Call::Put { .. } => Method::Put,
            Call::Post { .. } => Method::Post,
            Call::Delete { .. } => Method::Delete,
            Call::YangPatch { .. } => Method::YangPatch,
        }
    }

    /// Target path; the empty string for a YANG-Patch.
    pub fn path(&self) -> &str {
        match self {
            Call::Get { path }
            | Call::Patch { path, .. }
            | Call::Put { path, .. }
            | Call::Post { path, .. }
            | Call::Delete { path } => path,
            Call::YangPatch { .. } => "",
        }
    }
}

#[derive(Debug)]
struct ScriptedFailure {
    method: Method,
    path: Option<String>,
    status: u16,
    message: String,
}

impl ScriptedFailure {
    fn matches(&self, method: Method, path: &str) -> bool {
        self.method == method && self.path.as_deref().is_none_or(|p| p == path)
    }

    fn to_error(&self, path: &str) -> ClientError {
        let tag = match self.status {
            404 => "invalid-value",
            409 => "data-exists",
            _ => "operation-failed",
        };
        ClientError::status(
            self.method,
            path,
            self.status,
            RestconfError::application(tag, self.message.clone()),
        )
    }
}

/// Wraps a [`MemoryStore`], logging each call and optionally failing
/// scripted ones before they reach the store.
///
/// # Example
///
/// ```rust
/// use confsync_client::{Method, RemoteClient};
/// use confsync_test_utils::RecordingClient;
///
/// let client = RecordingClient::new();
/// client.fail_next(Method::Delete, 500, "boom");
///
/// assert!(client.delete("a").is_err());
/// assert_eq!(client.calls().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingClient {
    store: MemoryStore,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<ScriptedFailure>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Fail the next call using `method`, whatever its path.
    pub fn fail_next(&self, method: Method, status: u16, message: impl Into<String>) {
        lock(&self.failures).push_back(ScriptedFailure {
            method,
            path: None,
            status,
            message: message.into(),
        });
    }

    /// Fail the next call using `method` on exactly `path`.
    pub fn fail_at(&self, method: Method, path: impl Into<String>, status: u16, message: impl Into<String>) {
        lock(&self.failures).push_back(ScriptedFailure {
            method,
            path: Some(path.into()),
            status,
            message: message.into(),
        });
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Calls received using `method`.
    pub fn calls_of(&self, method: Method) -> Vec<Call> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method() == method)
            .cloned()
            .collect()
    }

    /// Paths of the calls received using `method`.
    pub fn paths_of(&self, method: Method) -> Vec<String> {
        self.calls_of(method)
            .iter()
            .map(|c| c.path().to_string())
            .collect()
    }

    /// Calls that write to the store (everything except GET).
    pub fn writes(&self) -> Vec<Call> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method() != Method::Get)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn tree(&self) -> Value {
        self.store.tree()
    }

    fn record(&self, call: Call) -> Result<()> {
        let method = call.method();
        let path = call.path().to_string();
        lock(&self.calls).push(call);

        let mut failures = lock(&self.failures);
        if let Some(index) = failures.iter().position(|f| f.matches(method, &path))
            && let Some(failure) = failures.remove(index)
        {
            return Err(failure.to_error(&path));
        }
        Ok(())
    }
}

impl RemoteClient for RecordingClient {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        self.record(Call::Get {
            path: path.to_string(),
        })?;
        self.store.get(path, query)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Response> {
        self.record(Call::Patch {
            path: path.to_string(),
            body: body.clone(),
        })?;
        self.store.patch(path, body)
    }

    fn put(&self, path: &str, body: &Value) -> Result<Response> {
        self.record(Call::Put {
            path: path.to_string(),
            body: body.clone(),
        })?;
        self.store.put(path, body)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Response> {
        self.record(Call::Post {
            path: path.to_string(),
            body: body.clone(),
        })?;
        self.store.post(path, body)
    }

    fn delete(&self, path: &str) -> Result<Response> {
        self.record(Call::Delete {
            path: path.to_string(),
        })?;
        self.store.delete(path)
    }

    fn yang_patch(&self, patch: &YangPatch) -> Result<Response> {
        self.record(Call::YangPatch {
            patch: patch.clone(),
        })?;
        self.store.yang_patch(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_in_order() {
        let client = RecordingClient::new();
        client.put("a", &json!({"a": {"x": "1"}})).unwrap();
        client.get("a", &[]).unwrap();
        client.delete("a").unwrap();

        let methods: Vec<Method> = client.calls().iter().map(Call::method).collect();
        assert_eq!(methods, vec![Method::Put, Method::Get, Method::Delete]);
        assert_eq!(client.tree(), json!({}));
    }

    #[test]
    fn test_scripted_failure_fires_once() {
        let client = RecordingClient::new();
        client.fail_at(Method::Put, "b", 500, "boom");

        client.put("a", &json!({"a": {}})).unwrap();
        let err = client.put("b", &json!({"b": {}})).unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.error_message(), Some("boom"));
        client.put("b", &json!({"b": {}})).unwrap();
        assert_eq!(client.paths_of(Method::Put), vec!["a", "b", "b"]);
    }

    #[test]
    fn test_failed_call_does_not_reach_store() {
        let client = RecordingClient::new();
        client.fail_next(Method::Put, 409, "exists");
        assert!(client.put("a", &json!({"a": {}})).is_err());
        assert_eq!(client.tree(), json!({}));
    }
}
