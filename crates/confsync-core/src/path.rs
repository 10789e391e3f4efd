//! Path resolution
//!
//! Nodes live below `tailf-ncs:devices`, anchored at one of three roots:
//!
//! ```text
//! device-config   tailf-ncs:devices/device=<name>/config[/<path>]
//! device          tailf-ncs:devices/device=<name>[/<path>]
//! device-group    tailf-ncs:devices/device-group=<name>[/<path>]
//! ```
//!
//! The name is percent-encoded because it is used as a list selector; the
//! path suffix is appended as given, without surrounding `/`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::node::{ConfigNode, NodeRoot};

/// Root of the device tree.
pub const DEVICES_ROOT: &str = "tailf-ncs:devices";

/// Generic configuration root whose body key is spelled `config`.
const GENERIC_CONFIG_ROOT: &str = "tailf-ncs:config";

/// Member identifying device and device-group entries.
const ENTRY_KEY: &str = "name";

/// Anything, then `=`, then a final segment without `/`.
static TRAILING_SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)=[^/]*$").expect("valid selector pattern"));

fn trimmed_suffix(suffix: Option<&str>) -> Option<&str> {
    suffix.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty())
}

/// Full path of `suffix` below the `root` named `name`.
pub fn node_path(root: NodeRoot, name: &str, suffix: Option<&str>) -> String {
    let mut path = format!("{}/{}={}", DEVICES_ROOT, root.list_name(), urlencoding::encode(name));
    if root == NodeRoot::DeviceConfig {
        path.push_str("/config");
    }
    if let Some(suffix) = trimmed_suffix(suffix) {
        path.push('/');
        path.push_str(suffix);
    }
    path
}

/// Full path of the configuration below `device`.
pub fn device_config_path(device: &str, suffix: Option<&str>) -> String {
    node_path(NodeRoot::DeviceConfig, device, suffix)
}

/// Remove a trailing `=selector`, leaving paths without one unchanged.
///
/// ```
/// use confsync_core::path::strip_list_selector;
/// assert_eq!(strip_list_selector("a/b/rule=10"), "a/b/rule");
/// assert_eq!(strip_list_selector("a/b/rule"), "a/b/rule");
/// ```
pub fn strip_list_selector(path: &str) -> &str {
    TRAILING_SELECTOR
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map_or(path, |m| m.as_str())
}

/// Last segment of `path` with any selector removed.
pub fn last_element(path: &str) -> &str {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.split_once('=').map_or(last, |(name, _)| name)
}

/// Key under which a body or response carries the resource at `path`.
pub fn root_key(path: &str) -> &str {
    match last_element(path) {
        GENERIC_CONFIG_ROOT => "config",
        other => other,
    }
}

/// Root, name and suffix of a node path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    pub root: NodeRoot,
    pub name: String,
    pub suffix: Option<String>,
}

impl NodeAddress {
    pub fn new(root: NodeRoot, name: impl Into<String>, suffix: Option<&str>) -> Self {
        Self {
            root,
            name: name.into(),
            suffix: trimmed_suffix(suffix).map(str::to_string),
        }
    }

    /// Full path, see [`node_path`].
    pub fn path(&self) -> String {
        node_path(self.root, &self.name, self.suffix.as_deref())
    }
}

/// Recover the address of a node path produced by [`ConfigNode::path`].
///
/// A device path continuing with a `config` segment is read as a
/// device-config path.
pub fn parse_node_path(id: &str) -> Result<NodeAddress> {
    let rest = id
        .trim_matches('/')
        .strip_prefix(DEVICES_ROOT)
        .and_then(|r| r.strip_prefix('/'))
        .ok_or_else(|| Error::invalid_path(id, format!("expected a path below {}", DEVICES_ROOT)))?;

    let (root, rest) = if let Some(r) = rest.strip_prefix("device=") {
        (NodeRoot::Device, r)
    } else if let Some(r) = rest.strip_prefix("device-group=") {
        (NodeRoot::DeviceGroup, r)
    } else {
        return Err(Error::invalid_path(id, "expected device=<name> or device-group=<name>"));
    };

    let (encoded, tail) = rest.split_once('/').unwrap_or((rest, ""));
    if encoded.is_empty() {
        return Err(Error::invalid_path(id, "name is empty"));
    }
    let name = urlencoding::decode(encoded)
        .map_err(|e| Error::invalid_path(id, e.to_string()))?
        .into_owned();

    let (root, suffix) = match (root, tail.split_once('/').map_or(tail, |(first, _)| first)) {
        (NodeRoot::Device, "config") => (NodeRoot::DeviceConfig, &tail["config".len()..]),
        _ => (root, tail),
    };
    Ok(NodeAddress::new(root, name, Some(suffix)))
}

impl ConfigNode {
    /// Full path of the node. Pure function of `root`, `device` and `path`.
    pub fn path(&self) -> String {
        node_path(self.root, &self.device, self.path.as_deref())
    }

    /// Where the node lives.
    pub fn address(&self) -> NodeAddress {
        NodeAddress::new(self.root, self.device.clone(), self.path.as_deref())
    }

    /// Node path with a trailing list selector removed.
    pub fn short_path(&self) -> String {
        strip_list_selector(&self.path()).to_string()
    }

    /// Body key of the node, see [`root_key`].
    pub fn root_key(&self) -> String {
        root_key(&self.path()).to_string()
    }

    /// Key member a body must carry when the node is a device or
    /// device-group entry, with the value it must hold.
    pub fn entry_key(&self) -> Option<(&'static str, &str)> {
        match self.root {
            NodeRoot::Device | NodeRoot::DeviceGroup
                if trimmed_suffix(self.path.as_deref()).is_none() =>
            {
                Some((ENTRY_KEY, self.device.as_str()))
            }
            _ => None,
        }
    }
}
