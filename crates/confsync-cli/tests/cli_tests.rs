//! Integration tests for the confsync CLI binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd against
//! a temporary workspace with a file-backed store.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

use confsync_test_utils::TestWorkspace;
use confsync_test_utils::fixtures::{device_tree, device_with_config};

const SVC_TOML: &str = r#"device = "ce0"
path = "svc"

[attributes]
x = "1"

[[lists]]
name = "rule"
key = "id"
items = [{ id = "10", action = "permit" }]
"#;

const SVC_TOML_NO_RULES: &str = r#"device = "ce0"
path = "svc"

[attributes]
x = "1"
"#;

/// Get a Command for the confsync binary, running in `ws`
fn confsync(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("confsync"));
    cmd.current_dir(ws.root()).env_remove("CONFSYNC_CONFIG");
    cmd
}

fn svc_config(ws: &TestWorkspace) -> serde_json::Value {
    ws.store_tree()["tailf-ncs:devices"]["device"][0]["config"]["svc"].clone()
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_output() {
    let ws = TestWorkspace::new();
    confsync(&ws)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("confsync"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("rollback"));
}

#[test]
fn test_no_command_shows_hint() {
    let ws = TestWorkspace::new();
    confsync(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("confsync --help"));
}

// ============================================================================
// Offline commands
// ============================================================================

#[test]
fn test_body_prints_write_payload() {
    let ws = TestWorkspace::new();
    ws.write("svc.toml", SVC_TOML);

    let output = confsync(&ws).args(["body", "svc.toml"]).output().unwrap();
    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        body,
        json!({"svc": {"x": "1", "rule": [{"id": "10", "action": "permit"}]}})
    );
}

#[test]
fn test_diff_lists_dropped_entries() {
    let ws = TestWorkspace::new();
    ws.write("plan.toml", SVC_TOML_NO_RULES);
    ws.write("state.toml", SVC_TOML);

    confsync(&ws)
        .args(["diff", "plan.toml", "state.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "tailf-ncs:devices/device=ce0/config/svc/rule=10",
        ));

    confsync(&ws)
        .args(["diff", "state.toml", "state.toml", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"has_changes\": false"));
}

#[test]
fn test_unsupported_definition_format() {
    let ws = TestWorkspace::new();
    ws.write("svc.ini", "device = ce0");

    confsync(&ws)
        .args(["body", "svc.ini"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

// ============================================================================
// Node lifecycle
// ============================================================================

#[test]
fn test_apply_create_then_update() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));
    ws.write("svc.toml", SVC_TOML);

    confsync(&ws)
        .args(["apply", "svc.toml", "--state", "svc.state.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    assert_eq!(
        svc_config(&ws),
        json!({"x": "1", "rule": [{"id": "10", "action": "permit"}]})
    );
    let state = ws.read_json("svc.state.json");
    assert_eq!(state["id"], "tailf-ncs:devices/device=ce0/config/svc");

    ws.write("svc.toml", SVC_TOML_NO_RULES);
    confsync(&ws)
        .args(["apply", "svc.toml", "--state", "svc.state.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated"))
        .stdout(predicate::str::contains("svc/rule=10"));

    assert_eq!(svc_config(&ws), json!({"x": "1", "rule": []}));
    assert!(ws.read_json("svc.state.json").get("lists").is_none());
}

#[test]
fn test_apply_rejects_identity_change() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));
    ws.write("svc.toml", SVC_TOML);
    confsync(&ws)
        .args(["apply", "svc.toml", "--state", "svc.state.json"])
        .assert()
        .success();

    ws.write("svc.toml", &SVC_TOML.replace("path = \"svc\"", "path = \"other\""));
    confsync(&ws)
        .args(["apply", "svc.toml", "--state", "svc.state.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("destroy the state first"));
}

#[test]
fn test_refresh_reports_drift() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_with_config("ce0", json!({"svc": {"x": "2"}})));
    ws.write("svc.state.toml", SVC_TOML_NO_RULES);

    confsync(&ws)
        .args(["refresh", "svc.state.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x: 1 -> 2"));

    confsync(&ws)
        .args(["refresh", "svc.state.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No drift"));
}

#[test]
fn test_destroy_removes_config_and_state() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));
    ws.write("svc.toml", SVC_TOML);
    confsync(&ws)
        .args(["apply", "svc.toml", "--state", "svc.state.json"])
        .assert()
        .success();

    confsync(&ws)
        .args(["destroy", "svc.state.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Destroyed"));

    assert!(!ws.exists("svc.state.json"));
    assert_eq!(
        ws.store_tree()["tailf-ncs:devices"]["device"][0]["config"],
        json!({})
    );
}

#[test]
fn test_unknown_instance_fails() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));
    ws.write("svc.toml", &format!("instance = \"prod\"\n{}", SVC_TOML));

    confsync(&ws)
        .args(["apply", "svc.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("prod"));
}

#[test]
fn test_missing_settings_fails() {
    let ws = TestWorkspace::new();
    ws.write("svc.toml", SVC_TOML);

    confsync(&ws)
        .args(["apply", "svc.toml", "-c", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
}

// ============================================================================
// Show and import
// ============================================================================

#[test]
fn test_show_json() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_with_config("ce0", json!({"svc": {"x": "1", "flag": [null]}})));

    let output = confsync(&ws)
        .args(["show", "--device", "ce0", "--path", "svc", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let attrs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(attrs, json!({"x": "1", "flag": ""}));
}

#[test]
fn test_apply_and_show_device_group() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0", "ce1"]));
    ws.write(
        "edge.toml",
        r#"device = "edge"
root = "device-group"

[attributes]
location = "east"

[[lists]]
name = "device-name"
values = ["ce0", "ce1"]
"#,
    );

    confsync(&ws)
        .args(["apply", "edge.toml", "--state", "edge.state.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tailf-ncs:devices/device-group=edge"));
    assert_eq!(
        ws.store_tree()["tailf-ncs:devices"]["device-group"],
        json!([{"name": "edge", "location": "east", "device-name": ["ce0", "ce1"]}])
    );
    assert_eq!(ws.read_json("edge.state.json")["root"], "device-group");

    let output = confsync(&ws)
        .args(["show", "-d", "edge", "--root", "device-group", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let attrs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(attrs, json!({"name": "edge", "location": "east"}));
}

#[test]
fn test_import_writes_state() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_with_config("ce0", json!({"svc": {"x": "1"}})));

    confsync(&ws)
        .args([
            "import",
            "tailf-ncs:devices/device=ce0/config/svc",
            "--state",
            "svc.state.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 attribute(s) present"));

    let state = ws.read_json("svc.state.json");
    assert_eq!(state["device"], "ce0");
    assert_eq!(state["path"], "svc");

    confsync(&ws)
        .args([
            "import",
            "tailf-ncs:devices/device=ce0/config/svc",
            "--state",
            "svc.state.json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));
}

// ============================================================================
// Commit and rollback
// ============================================================================

#[test]
fn test_commit_and_rollback() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_with_config("ce0", json!({"svc": {"x": "1"}})));
    ws.write_json(
        "change.json",
        &json!({"device": [{"name": "ce0", "config": {"svc": {"x": "2"}}}]}),
    );

    confsync(&ws)
        .args(["commit", "change.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry-Run Diff"));
    assert_eq!(svc_config(&ws), json!({"x": "1"}));

    confsync(&ws)
        .args(["commit", "change.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("confsync rollback 1"));
    assert_eq!(svc_config(&ws), json!({"x": "2"}));

    confsync(&ws)
        .args(["rollback", "1", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback Dry-Run Result"));

    confsync(&ws)
        .args(["rollback", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback operation completed successfully"));
    assert_eq!(svc_config(&ws), json!({"x": "1"}));
}

#[test]
fn test_rollback_unknown_id() {
    let ws = TestWorkspace::new();
    ws.seed_store(&device_tree(&["ce0"]));

    confsync(&ws)
        .args(["rollback", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("9"));
}

#[test]
fn test_yang_patch_strategy() {
    let ws = TestWorkspace::with_settings(
        &confsync_test_utils::workspace::DEFAULT_SETTINGS
            .replace("strategy = \"sequential\"", "strategy = \"yang-patch\""),
    );
    ws.seed_store(&device_tree(&["ce0"]));
    ws.write("svc.toml", SVC_TOML);

    confsync(&ws)
        .args(["apply", "svc.toml", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\": \"created\""));
    assert_eq!(
        svc_config(&ws),
        json!({"x": "1", "rule": [{"id": "10", "action": "permit"}]})
    );
}
