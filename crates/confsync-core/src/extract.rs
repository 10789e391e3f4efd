//! State extraction from read responses
//!
//! A read of a list entry may come back either as the entry object or wrapped
//! in a one-element array. [`response_prefix`] resolves that once; everything
//! after it reads through the returned prefix.
//!
//! Empty and presence leaves are reported as `{}` or `[null]`; both read back
//! as the empty string, the same as an absent leaf.

use serde_json::Value;

use confsync_value::{escape_key, filter_segment, get, is_empty_leaf, slash_to_dotted, to_scalar_string};

use crate::node::{Attributes, ConfigNode, ListEntries};
use crate::path::root_key;

/// Path expression of the resource carried under `root` in `tree`.
pub fn response_prefix(tree: &Value, root: &str) -> String {
    let root = escape_key(root);
    match get(tree, &root) {
        Some(Value::Array(_)) => format!("{}.0", root),
        _ => root,
    }
}

/// String value at `expr`, or `""` when absent or empty.
fn read_scalar(tree: &Value, expr: &str) -> String {
    match get(tree, expr) {
        Some(value) if !is_empty_leaf(value) => to_scalar_string(value),
        _ => String::new(),
    }
}

/// Refresh `node` from a read response.
///
/// Only attributes, items and item fields the node already has are read; a
/// requested value missing from the response becomes `""`. Leaf-lists are
/// replaced by the remote values whenever the response carries an array.
pub fn apply_response(node: &mut ConfigNode, tree: &Value) {
    let prefix = response_prefix(tree, &node.root_key());

    for (attr, value) in node.attributes.iter_mut() {
        *value = read_scalar(tree, &format!("{}.{}", prefix, slash_to_dotted(attr)));
    }

    for list in node.lists.iter_mut() {
        let list_expr = format!("{}.{}", prefix, slash_to_dotted(&list.name));
        match &mut list.entries {
            ListEntries::Items(items) => {
                for item in items.iter_mut() {
                    let key_value = item.get(&list.key).cloned().unwrap_or_default();
                    let entry_expr =
                        format!("{}.{}", list_expr, filter_segment(&list.key, &key_value));
                    for (attr, value) in item.iter_mut() {
                        *value = read_scalar(tree, &format!("{}.{}", entry_expr, escape_key(attr)));
                    }
                }
            }
            ListEntries::Values(values) if !values.is_empty() => {
                if let Some(Value::Array(remote)) = get(tree, &list_expr) {
                    *values = remote.iter().map(to_scalar_string).collect();
                }
            }
            ListEntries::Values(_) => {}
        }
    }
}

/// Every scalar member of the resource at `path`, as read-only attributes.
///
/// Empty leaves read as `""`; nested containers and lists are skipped.
pub fn extract_all(path: &str, tree: &Value) -> Attributes {
    let prefix = response_prefix(tree, root_key(path));
    let Some(Value::Object(members)) = get(tree, &prefix) else {
        return Attributes::new();
    };

    members
        .iter()
        .filter_map(|(name, value)| {
            let value = match value {
                v if is_empty_leaf(v) => String::new(),
                Value::Object(_) | Value::Array(_) => return None,
                scalar => to_scalar_string(scalar),
            };
            Some((name.clone(), value))
        })
        .collect()
}
