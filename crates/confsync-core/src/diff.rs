//! Deleted item detection
//!
//! A merge-write never removes anything, so list entries and leaf-list values
//! dropped from the plan have to be deleted explicitly. Paths are emitted in
//! the order the prior state lists them.

use tracing::debug;

use crate::node::{ConfigNode, ListEntries};

/// Paths of prior list entries and leaf-list values missing from `plan`.
///
/// A list absent from the plan counts as empty. Prior items without a key
/// value are never deleted.
pub fn detect_deletions(plan: &ConfigNode, prior: &ConfigNode) -> Vec<String> {
    let base = prior.path();
    let mut deletions = Vec::new();

    for prior_list in &prior.lists {
        let name = &prior_list.name;
        let planned = plan.list(name);

        match &prior_list.entries {
            ListEntries::Items(items) => {
                let planned_items = planned.map(|l| l.items()).unwrap_or_default();
                for item in items {
                    let key_value = prior_list.key_of(item);
                    if key_value.is_empty() {
                        continue;
                    }
                    let found = planned_items
                        .iter()
                        .any(|p| p.get(&prior_list.key).map(String::as_str) == Some(key_value));
                    if !found {
                        deletions.push(format!("{}/{}={}", base, name, key_value));
                    }
                }
            }
            ListEntries::Values(values) => {
                let planned_values = planned.map(|l| l.values()).unwrap_or_default();
                for value in values {
                    if !planned_values.contains(value) {
                        deletions.push(format!("{}/{}={}", base, name, value));
                    }
                }
            }
        }
    }

    if !deletions.is_empty() {
        debug!(path = %base, ?deletions, "list items to delete");
    }
    deletions
}

/// Every path a node manages, for leaf-by-leaf teardown.
///
/// One path per attribute, one per keyed item and one per leaf-list value.
/// Items without a key value are skipped.
pub fn delete_paths(state: &ConfigNode) -> Vec<String> {
    let base = state.path();
    let mut paths: Vec<String> = state
        .attributes
        .keys()
        .map(|attr| format!("{}/{}", base, attr))
        .collect();

    for list in &state.lists {
        match &list.entries {
            ListEntries::Items(items) => paths.extend(
                items
                    .iter()
                    .map(|item| list.key_of(item))
                    .filter(|key| !key.is_empty())
                    .map(|key| format!("{}/{}={}", base, list.name, key)),
            ),
            ListEntries::Values(values) => paths.extend(
                values
                    .iter()
                    .map(|value| format!("{}/{}={}", base, list.name, value)),
            ),
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ListItem, ListSpec};
    use pretty_assertions::assert_eq;

    const BASE: &str = "tailf-ncs:devices/device=ce0/config/svc";

    fn item(id: &str, v: &str) -> ListItem {
        ListItem::from([
            ("id".to_string(), id.to_string()),
            ("v".to_string(), v.to_string()),
        ])
    }

    fn node(lists: Vec<ListSpec>) -> ConfigNode {
        let mut node = ConfigNode::new("ce0").with_path("svc");
        node.lists = lists;
        node
    }

    #[test]
    fn test_keyed_item_removed() {
        let prior = node(vec![ListSpec::keyed("listname", "id", vec![item("1", "a"), item("2", "b")])]);
        let plan = node(vec![ListSpec::keyed("listname", "id", vec![item("1", "a")])]);
        assert_eq!(
            detect_deletions(&plan, &prior),
            vec![format!("{}/listname=2", BASE)]
        );
    }

    #[test]
    fn test_leaf_list_value_removed() {
        let prior = node(vec![ListSpec::leaf_list("listname", ["x", "y", "z"])]);
        let plan = node(vec![ListSpec::leaf_list("listname", ["x", "z"])]);
        assert_eq!(
            detect_deletions(&plan, &prior),
            vec![format!("{}/listname=y", BASE)]
        );
    }

    #[test]
    fn test_missing_plan_list_deletes_all_in_prior_order() {
        let prior = node(vec![ListSpec::keyed("rule", "id", vec![item("3", ""), item("1", "")])]);
        let plan = node(Vec::new());
        assert_eq!(
            detect_deletions(&plan, &prior),
            vec![format!("{}/rule=3", BASE), format!("{}/rule=1", BASE)]
        );
    }

    #[test]
    fn test_changed_item_fields_are_not_deletions() {
        let prior = node(vec![ListSpec::keyed("rule", "id", vec![item("1", "a")])]);
        let plan = node(vec![ListSpec::keyed("rule", "id", vec![item("1", "b")])]);
        assert!(detect_deletions(&plan, &prior).is_empty());
    }

    // Items that never got a key are left alone even when the plan drops
    // the whole list.
    #[test]
    fn test_items_without_key_are_skipped() {
        let keyless = ListItem::from([("v".to_string(), "a".to_string())]);
        let prior = node(vec![ListSpec::keyed(
            "rule",
            "id",
            vec![item("", "a"), keyless, item("2", "b")],
        )]);
        let plan = node(Vec::new());
        assert_eq!(
            detect_deletions(&plan, &prior),
            vec![format!("{}/rule=2", BASE)]
        );
    }

    #[test]
    fn test_delete_paths() {
        let state = node(vec![
            ListSpec::keyed("rule", "id", vec![item("10", "a"), item("", "b")]),
            ListSpec::leaf_list("names", ["n1"]),
        ])
        .with_attribute("x", "1")
        .with_attribute("ip/address", "10.0.0.1");
        assert_eq!(
            delete_paths(&state),
            vec![
                format!("{}/ip/address", BASE),
                format!("{}/x", BASE),
                format!("{}/rule=10", BASE),
                format!("{}/names=n1", BASE),
            ]
        );
    }
}
