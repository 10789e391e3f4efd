//! Store trees and node definitions shared across suites

use serde_json::{Value, json};

/// Device path of the node used by [`svc_node`].
pub const SVC_PATH: &str = "tailf-ncs:devices/device=ce0/config/svc";

/// A device tree holding an empty `config` container per device.
pub fn device_tree(devices: &[&str]) -> Value {
    let entries: Vec<Value> = devices
        .iter()
        .map(|name| json!({"name": name, "config": {}}))
        .collect();
    json!({"tailf-ncs:devices": {"device": entries}})
}

/// A device tree whose single device `name` carries `config`.
pub fn device_with_config(name: &str, config: Value) -> Value {
    json!({"tailf-ncs:devices": {"device": [{"name": name, "config": config}]}})
}

/// Definition of a `svc` node on `ce0`: one attribute and one rule per id.
pub fn svc_node(rules: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = rules
        .iter()
        .map(|(id, action)| json!({"id": id, "action": action}))
        .collect();
    json!({
        "device": "ce0",
        "path": "svc",
        "attributes": {"x": "1"},
        "lists": [{"name": "rule", "key": "id", "items": items}]
    })
}
