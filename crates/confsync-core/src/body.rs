//! Request body construction
//!
//! Turns a node into the merge-write payload for its path:
//!
//! ```text
//! {"<root key>": {
//!     "<attr>": "<value>",          attributes, `/` nesting containers
//!     "<list>": [{...}, {...}],     keyed items, in plan order
//!     "<leaf-list>": ["a", "b"]     leaf-list values
//! }}
//! ```
//!
//! Device and device-group entries also carry their `name`, so a merge into
//! the parent list finds the right entry.

use serde_json::{Map, Value};
use tracing::trace;

use confsync_value::{escape_key, set, slash_to_dotted};

use crate::error::Result;
use crate::node::{ConfigNode, ListEntries};

/// Build the merge-write body for `node`. Performs no I/O.
pub fn build_body(node: &ConfigNode) -> Result<Value> {
    let root = node.root_key();
    let root_expr = escape_key(&root);

    let mut body = Value::Object(Map::new());
    set(&mut body, &root_expr, Value::Object(Map::new()))?;

    if let Some((key, name)) = node.entry_key() {
        let expr = format!("{}.{}", root_expr, escape_key(key));
        set(&mut body, &expr, Value::String(name.to_string()))?;
    }

    for (attr, value) in &node.attributes {
        let expr = format!("{}.{}", root_expr, slash_to_dotted(attr));
        set(&mut body, &expr, Value::String(value.clone()))?;
    }

    for list in &node.lists {
        let list_expr = format!("{}.{}", root_expr, slash_to_dotted(&list.name));
        match &list.entries {
            ListEntries::Items(items) if !items.is_empty() => {
                set(&mut body, &list_expr, Value::Array(Vec::new()))?;
                let append = format!("{}.-1", list_expr);
                for item in items {
                    let entry: Map<String, Value> = item
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    set(&mut body, &append, Value::Object(entry))?;
                }
            }
            ListEntries::Values(values) if !values.is_empty() => {
                let values = values.iter().cloned().map(Value::String).collect();
                set(&mut body, &list_expr, Value::Array(values))?;
            }
            _ => {}
        }
    }

    trace!(path = %node.path(), %body, "built body");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ListItem, ListSpec, NodeRoot};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn item(pairs: &[(&str, &str)]) -> ListItem {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_device_group_body_carries_name() {
        let node = ConfigNode::new("edge")
            .with_root(NodeRoot::DeviceGroup)
            .with_list(ListSpec::leaf_list("device-name", ["ce0", "ce1"]));
        assert_eq!(
            build_body(&node).unwrap(),
            json!({"device-group": {"name": "edge", "device-name": ["ce0", "ce1"]}})
        );
    }

    #[test]
    fn test_device_body_nests_settings() {
        let node = ConfigNode::new("ce9")
            .with_root(NodeRoot::Device)
            .with_attribute("address", "10.0.0.9")
            .with_attribute("state/admin-state", "unlocked");
        assert_eq!(
            build_body(&node).unwrap(),
            json!({"device": {
                "name": "ce9",
                "address": "10.0.0.9",
                "state": {"admin-state": "unlocked"}
            }})
        );
    }

    #[test]
    fn test_empty_node_body() {
        let node = ConfigNode::new("ce0");
        assert_eq!(build_body(&node).unwrap(), json!({"config": {}}));
    }

    #[test]
    fn test_nested_attributes() {
        let node = ConfigNode::new("ce0")
            .with_path("ios:interface/GigabitEthernet=1")
            .with_attribute("description", "uplink")
            .with_attribute("ip/address/primary/address", "10.0.0.1");
        assert_eq!(
            build_body(&node).unwrap(),
            json!({"GigabitEthernet": {
                "description": "uplink",
                "ip": {"address": {"primary": {"address": "10.0.0.1"}}}
            }})
        );
    }

    #[test]
    fn test_dotted_attribute_stays_one_key() {
        let node = ConfigNode::new("ce0")
            .with_path("svc")
            .with_attribute("ip.v4", "on");
        assert_eq!(build_body(&node).unwrap(), json!({"svc": {"ip.v4": "on"}}));
    }

    #[test]
    fn test_items_keep_plan_order() {
        let node = ConfigNode::new("ce0").with_path("svc").with_list(ListSpec::keyed(
            "rule",
            "id",
            vec![item(&[("id", "20")]), item(&[("id", "10")])],
        ));
        assert_eq!(
            build_body(&node).unwrap(),
            json!({"svc": {"rule": [{"id": "20"}, {"id": "10"}]}})
        );
    }

    #[test]
    fn test_leaf_list_and_empty_lists() {
        let node = ConfigNode::new("ce0")
            .with_path("grp")
            .with_list(ListSpec::leaf_list("device-name", ["a", "b"]))
            .with_list(ListSpec::keyed("empty", "id", Vec::new()))
            .with_list(ListSpec::leaf_list("none", Vec::<String>::new()));
        assert_eq!(
            build_body(&node).unwrap(),
            json!({"grp": {"device-name": ["a", "b"]}})
        );
    }

    #[test]
    fn test_nested_list_name() {
        let node = ConfigNode::new("ce0")
            .with_path("svc")
            .with_list(ListSpec::leaf_list("acl/names", ["a"]));
        assert_eq!(
            build_body(&node).unwrap(),
            json!({"svc": {"acl": {"names": ["a"]}}})
        );
    }
}
