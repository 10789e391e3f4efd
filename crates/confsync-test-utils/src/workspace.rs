//! [`TestWorkspace`]: a temporary directory laid out for the CLI

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// Settings written by [`TestWorkspace::new`]: one instance `lab` backed by
/// `stores/lab.json`, with `rule` entries keyed by `id`.
pub const DEFAULT_SETTINGS: &str = r#"default_instance = "lab"

[reconcile]
strategy = "sequential"
delete_mode = "all"

[instances.lab]
store = "stores/lab.json"

[instances.lab.list_keys]
rule = "id"
"#;

/// Relative path of the `lab` store file.
pub const LAB_STORE: &str = "stores/lab.json";

/// A temporary directory holding `confsync.toml`, store files and node
/// definitions.
///
/// # Example
///
/// ```rust
/// use confsync_test_utils::{TestWorkspace, fixtures};
///
/// let ws = TestWorkspace::new();
/// ws.seed_store(&fixtures::device_tree(&["ce0"]));
/// let node = ws.write_json("node.json", &fixtures::svc_node(&[("10", "permit")]));
/// assert!(node.exists());
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Workspace with [`DEFAULT_SETTINGS`].
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_SETTINGS)
    }

    pub fn with_settings(settings: &str) -> Self {
        let ws = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        ws.write("confsync.toml", settings);
        ws
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root().join("confsync.toml")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn write_json(&self, rel: &str, value: &Value) -> PathBuf {
        self.write(rel, &serde_json::to_string_pretty(value).unwrap())
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
    }

    pub fn read_json(&self, rel: &str) -> Value {
        serde_json::from_str(&self.read(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Replace the `lab` store contents with `tree`.
    pub fn seed_store(&self, tree: &Value) {
        self.write_json(LAB_STORE, &json!({"data": tree}));
    }

    /// Current tree of the `lab` store.
    pub fn store_tree(&self) -> Value {
        self.read_json(LAB_STORE)["data"].clone()
    }
}
