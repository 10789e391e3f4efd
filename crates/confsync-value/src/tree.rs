//! Read and write operations over value trees
//!
//! These mirror the operations a RESTCONF payload needs: look a leaf up by
//! path, decide whether it carries a value, and build request bodies by
//! setting values (or raw JSON fragments) at paths that may not exist yet.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::path::{PathSegment, parse_path};

/// Get the value at `expr`.
///
/// Returns `None` if the expression is invalid or the path doesn't exist.
///
/// # Examples
///
/// ```
/// use confsync_value::get;
/// use serde_json::json;
///
/// let tree = json!({"svc": {"rule": [{"id": "10", "action": "permit"}]}});
/// assert_eq!(get(&tree, r#"svc.rule.#(id=="10").action"#), Some(&json!("permit")));
/// assert_eq!(get(&tree, "svc.rule.0.id"), Some(&json!("10")));
/// assert_eq!(get(&tree, "svc.missing"), None);
/// ```
pub fn get<'a>(tree: &'a Value, expr: &str) -> Option<&'a Value> {
    let segments = parse_path(expr).ok()?;
    get_at_path(tree, &segments)
}

/// Whether a value exists at `expr`.
pub fn exists(tree: &Value, expr: &str) -> bool {
    get(tree, expr).is_some()
}

fn get_at_path<'a>(value: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(value);
    };

    let next = match (first, value) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
        (PathSegment::Key(_), Value::Array(arr)) => arr.get(first.as_index()?)?,
        (PathSegment::Filter { field, value: wanted }, Value::Array(arr)) => {
            arr.iter().find(|el| matches_filter(el, field, wanted))?
        }
        _ => return None,
    };

    get_at_path(next, rest)
}

fn matches_filter(element: &Value, field: &str, wanted: &str) -> bool {
    element
        .get(field)
        .is_some_and(|v| to_scalar_string(v) == wanted)
}

/// Whether a leaf is present but carries no value.
///
/// Empty and presence leaves come back either as `{}` or as `[null]`
/// depending on the leaf type.
pub fn is_empty_leaf(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(arr) => arr.len() == 1 && arr[0].is_null(),
        _ => false,
    }
}

/// String form of a value.
///
/// Strings are returned unquoted, numbers and booleans in their JSON
/// spelling, `null` as the empty string, and containers as compact JSON.
pub fn to_scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Set `new_value` at `expr`, creating intermediate containers.
///
/// A `-1` segment appends to an array. Numeric segments address array
/// elements; an index equal to the array length appends.
///
/// # Examples
///
/// ```
/// use confsync_value::set;
/// use serde_json::json;
///
/// let mut tree = json!({"svc": {}});
/// set(&mut tree, "svc.ip.address", json!("10.0.0.1")).unwrap();
/// set(&mut tree, "svc.rule", json!([])).unwrap();
/// set(&mut tree, "svc.rule.-1", json!({"id": "10"})).unwrap();
/// assert_eq!(tree, json!({"svc": {"ip": {"address": "10.0.0.1"}, "rule": [{"id": "10"}]}}));
/// ```
pub fn set(tree: &mut Value, expr: &str, new_value: Value) -> Result<()> {
    let segments = parse_path(expr)?;
    if segments.is_empty() {
        return Err(Error::set_failed(expr, "empty path"));
    }
    set_at_path(tree, &segments, new_value).map_err(|reason| Error::set_failed(expr, reason))
}

/// Parse `raw` as JSON and set it at `expr`.
pub fn set_raw(tree: &mut Value, expr: &str, raw: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(raw)?;
    set(tree, expr, parsed)
}

fn set_at_path(
    value: &mut Value,
    segments: &[PathSegment],
    new_value: Value,
) -> std::result::Result<(), String> {
    let Some((first, rest)) = segments.split_first() else {
        *value = new_value;
        return Ok(());
    };

    if value.is_null() {
        *value = if first.is_append() || first.as_index().is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    match (first, value) {
        (PathSegment::Key(key), Value::Object(map)) => {
            let child = map.entry(key.clone()).or_insert(Value::Null);
            set_at_path(child, rest, new_value)
        }
        (PathSegment::Key(key), Value::Array(arr)) => {
            let idx = if first.is_append() {
                arr.len()
            } else {
                first
                    .as_index()
                    .ok_or_else(|| format!("`{}` is not an array index", key))?
            };
            if idx > arr.len() {
                return Err(format!("index {} out of bounds ({})", idx, arr.len()));
            }
            if idx == arr.len() {
                arr.push(Value::Null);
            }
            set_at_path(&mut arr[idx], rest, new_value)
        }
        (PathSegment::Filter { field, value: wanted }, Value::Array(arr)) => {
            let element = arr
                .iter_mut()
                .find(|el| matches_filter(el, field, wanted))
                .ok_or_else(|| format!("no element with {}=={}", field, wanted))?;
            set_at_path(element, rest, new_value)
        }
        (segment, other) => Err(format!(
            "cannot descend into {} with {:?}",
            kind_name(other),
            segment
        )),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
