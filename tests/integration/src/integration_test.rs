//! End-to-end flow across the workspace
//!
//! settings file -> file-backed instances -> node definitions -> reconcile
//! -> reopen the store and inspect what was persisted.

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use confsync_client::FileStore;
use confsync_core::{
    ClientSet, ConfigNode, Reconciler, ReconcilerOptions, build_body, commit, rollback,
};
use confsync_meta::{DefinitionStore, Settings};
use confsync_test_utils::TestWorkspace;
use confsync_test_utils::fixtures::{device_tree, svc_node};
use confsync_value::get;

const SVC_X: &str = r#"tailf-ncs:devices.device.#(name=="ce0").config.svc.x"#;
const SVC_RULES: &str = r#"tailf-ncs:devices.device.#(name=="ce0").config.svc.rule"#;

fn reconciler_for(ws: &TestWorkspace) -> Reconciler {
    let settings = Settings::load(&ws.settings_path()).unwrap();
    let clients = ClientSet::from_settings(&settings, ws.root()).unwrap();
    Reconciler::new(clients, ReconcilerOptions::from(&settings.reconcile))
}

fn persisted(path: &Path) -> Value {
    FileStore::open(path).unwrap().tree()
}

#[test]
fn test_definition_formats_agree() {
    let ws = TestWorkspace::new();
    ws.write(
        "svc.toml",
        r#"device = "ce0"
path = "svc"
[attributes]
x = "1"
[[lists]]
name = "rule"
key = "id"
items = [{ id = "10", action = "permit" }]
"#,
    );
    ws.write(
        "svc.yaml",
        r#"device: ce0
path: svc
attributes:
  x: "1"
lists:
  - name: rule
    key: id
    items:
      - id: "10"
        action: permit
"#,
    );
    ws.write_json("svc.json", &svc_node(&[("10", "permit")]));

    let definitions = DefinitionStore::new();
    let nodes: Vec<ConfigNode> = ["svc.toml", "svc.yaml", "svc.json"]
        .iter()
        .map(|name| definitions.load(&ws.path(name)).unwrap())
        .collect();

    assert_eq!(nodes[0], nodes[1]);
    assert_eq!(nodes[1], nodes[2]);
    assert_eq!(
        build_body(&nodes[0]).unwrap(),
        json!({"svc": {"x": "1", "rule": [{"id": "10", "action": "permit"}]}})
    );
}

#[test]
fn test_node_lifecycle_persists_through_file_store() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));
    let store_path = ws.path("stores/lab.json");
    let definitions = DefinitionStore::new();

    // create
    let plan: ConfigNode = serde_json::from_value(svc_node(&[("10", "permit"), ("20", "deny")])).unwrap();
    let state = reconciler_for(&ws).create(&plan).unwrap();
    definitions.save(&ws.path("svc.state.json"), &state).unwrap();

    let tree = persisted(&store_path);
    assert_eq!(get(&tree, SVC_X), Some(&json!("1")));
    assert_eq!(get(&tree, SVC_RULES).and_then(Value::as_array).map(Vec::len), Some(2));

    // update in a fresh process: prior state comes from disk
    let prior: ConfigNode = definitions.load(&ws.path("svc.state.json")).unwrap();
    let plan: ConfigNode = serde_json::from_value(svc_node(&[("20", "deny")])).unwrap();
    reconciler_for(&ws).update(&plan, &prior).unwrap();

    let tree = persisted(&store_path);
    assert_eq!(
        get(&tree, SVC_RULES),
        Some(&json!([{"id": "20", "action": "deny"}]))
    );

    // refresh sees an out-of-band edit
    let reconciler = reconciler_for(&ws);
    let client = reconciler.client(None).unwrap();
    client
        .patch(
            "tailf-ncs:devices/device=ce0/config/svc",
            &json!({"svc": {"x": "9"}}),
        )
        .unwrap();
    let refreshed = reconciler.read(&plan).unwrap();
    assert_eq!(refreshed.attributes["x"], "9");

    // delete twice
    reconciler.delete(&refreshed).unwrap();
    reconciler_for(&ws).delete(&refreshed).unwrap();
    assert_eq!(get(&persisted(&store_path), SVC_X), None);
}

#[test]
fn test_rollback_survives_reopen() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));
    let store_path = ws.path("stores/lab.json");

    let committed = {
        let reconciler = reconciler_for(&ws);
        commit(
            reconciler.client(None).unwrap(),
            &json!({"device": [{"name": "ce0", "config": {"svc": {"x": "5"}}}]}),
        )
        .unwrap()
    };
    assert_eq!(get(&persisted(&store_path), SVC_X), Some(&json!("5")));

    let reconciler = reconciler_for(&ws);
    rollback(reconciler.client(Some("lab")).unwrap(), committed.rollback_id).unwrap();
    assert_eq!(get(&persisted(&store_path), SVC_X), None);
}

#[test]
fn test_import_then_read_tracks_nothing_until_declared() {
    let ws = TestWorkspace::new();
    ws.seed_store(&json!({"tailf-ncs:devices": {"device": [
        {"name": "ce0", "config": {"svc": {"x": "1"}}}
    ]}}));
    let reconciler = reconciler_for(&ws);

    let imported = reconciler
        .import("tailf-ncs:devices/device=ce0/config/svc", None)
        .unwrap();
    assert_eq!(imported.id.as_deref(), Some("tailf-ncs:devices/device=ce0/config/svc"));
    assert!(reconciler.read(&imported).unwrap().attributes.is_empty());

    let declared = imported.clone().with_attribute("x", "");
    assert_eq!(reconciler.read(&declared).unwrap().attributes["x"], "1");
}
