//! Configuration node model
//!
//! A [`ConfigNode`] is one manageable unit of device configuration: scalar
//! attributes plus any number of nested lists. Lists are either keyed lists of
//! structured items or leaf-lists of scalar values, never both.
//!
//! Most nodes sit below a device's `config` container. A node can instead be
//! anchored at the device entry itself (address, port, authgroup and other
//! device settings) or at a device group.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Leaf name to scalar value. Leaf names may encode nested containers with `/`.
pub type Attributes = BTreeMap<String, String>;

/// One entry of a keyed list
pub type ListItem = BTreeMap<String, String>;

/// Entries of a [`ListSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntries {
    /// Structured entries identified by the list key
    Items(Vec<ListItem>),
    /// Bare scalar values of a leaf-list
    Values(Vec<String>),
}

impl Default for ListEntries {
    fn default() -> Self {
        ListEntries::Items(Vec::new())
    }
}

/// A nested repeatable group of a node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawListSpec", into = "RawListSpec")]
pub struct ListSpec {
    /// Remote list or leaf-list name
    pub name: String,
    /// Key attribute of each item; empty for leaf-lists
    pub key: String,
    pub entries: ListEntries,
}

impl ListSpec {
    /// A keyed list of structured items.
    pub fn keyed(name: impl Into<String>, key: impl Into<String>, items: Vec<ListItem>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            entries: ListEntries::Items(items),
        }
    }

    /// A leaf-list of scalar values.
    pub fn leaf_list<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            key: String::new(),
            entries: ListEntries::Values(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Structured items; empty for leaf-lists.
    pub fn items(&self) -> &[ListItem] {
        match &self.entries {
            ListEntries::Items(items) => items,
            ListEntries::Values(_) => &[],
        }
    }

    /// Scalar values; empty for keyed lists.
    pub fn values(&self) -> &[String] {
        match &self.entries {
            ListEntries::Values(values) => values,
            ListEntries::Items(_) => &[],
        }
    }

    /// Key value of `item`, or `""` when the item lacks its key.
    pub fn key_of<'a>(&self, item: &'a ListItem) -> &'a str {
        item.get(&self.key).map(String::as_str).unwrap_or("")
    }
}

/// Wire shape of a [`ListSpec`]: `items` and `values` side by side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawListSpec {
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    items: Vec<ListItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
}

impl TryFrom<RawListSpec> for ListSpec {
    type Error = String;

    fn try_from(raw: RawListSpec) -> std::result::Result<Self, Self::Error> {
        let entries = match (raw.items.is_empty(), raw.values.is_empty()) {
            (false, false) => {
                return Err(format!(
                    "list `{}` has both items and values; use one or the other",
                    raw.name
                ));
            }
            (true, false) => ListEntries::Values(raw.values),
            _ => ListEntries::Items(raw.items),
        };
        Ok(Self {
            name: raw.name,
            key: raw.key,
            entries,
        })
    }
}

impl From<ListSpec> for RawListSpec {
    fn from(spec: ListSpec) -> Self {
        let (items, values) = match spec.entries {
            ListEntries::Items(items) => (items, Vec::new()),
            ListEntries::Values(values) => (Vec::new(), values),
        };
        Self {
            name: spec.name,
            key: spec.key,
            items,
            values,
        }
    }
}

/// Where a node's path is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRoot {
    /// `tailf-ncs:devices/device=<name>/config`
    #[default]
    DeviceConfig,
    /// `tailf-ncs:devices/device=<name>`
    Device,
    /// `tailf-ncs:devices/device-group=<name>`
    DeviceGroup,
}

impl NodeRoot {
    /// Remote list the root is an entry of.
    pub fn list_name(self) -> &'static str {
        match self {
            NodeRoot::DeviceConfig | NodeRoot::Device => "device",
            NodeRoot::DeviceGroup => "device-group",
        }
    }

    fn is_device_config(&self) -> bool {
        *self == NodeRoot::DeviceConfig
    }
}

impl FromStr for NodeRoot {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "device-config" | "config" => Ok(NodeRoot::DeviceConfig),
            "device" => Ok(NodeRoot::Device),
            "device-group" | "group" => Ok(NodeRoot::DeviceGroup),
            _ => Err(Error::InvalidRoot { value: s.to_string() }),
        }
    }
}

impl fmt::Display for NodeRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRoot::DeviceConfig => write!(f, "device-config"),
            NodeRoot::Device => write!(f, "device"),
            NodeRoot::DeviceGroup => write!(f, "device-group"),
        }
    }
}

fn default_delete() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Desired or observed configuration of one device, device entry or group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// Client set entry the node is reconciled against; `None` is the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Resolved path, set once the node has been created or imported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Anchor of the node's path
    #[serde(default, skip_serializing_if = "NodeRoot::is_device_config")]
    pub root: NodeRoot,
    /// Device, or device group, the configuration belongs to
    pub device: String,
    /// Location below the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether destroying the node removes the remote configuration
    #[serde(default = "default_delete", skip_serializing_if = "is_true")]
    pub delete: bool,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<ListSpec>,
}

impl ConfigNode {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            instance: None,
            id: None,
            root: NodeRoot::DeviceConfig,
            device: device.into(),
            path: None,
            delete: true,
            attributes: Attributes::new(),
            lists: Vec::new(),
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_root(mut self, root: NodeRoot) -> Self {
        self.root = root;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_list(mut self, list: ListSpec) -> Self {
        self.lists.push(list);
        self
    }

    /// Keep the remote configuration when the node is destroyed.
    pub fn retain_on_destroy(mut self) -> Self {
        self.delete = false;
        self
    }

    /// Instance name used to look up the node's client; `""` is the default.
    pub fn instance_name(&self) -> &str {
        self.instance.as_deref().unwrap_or("")
    }

    /// List named `name`; the last one wins when a name repeats.
    pub fn list(&self, name: &str) -> Option<&ListSpec> {
        self.lists.iter().rfind(|l| l.name == name)
    }

    /// Forget everything observed about the remote configuration.
    pub fn clear_observed(&mut self) {
        self.attributes.clear();
        self.lists.clear();
    }
}
