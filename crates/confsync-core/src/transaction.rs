//! Commits, dry-runs and rollbacks against the device tree
//!
//! These are one-shot actions: each call issues a single request and
//! reports what the store said. Ids are stamped with the current Unix time.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use confsync_client::{ClientError, RemoteClient};
use confsync_value::{get, to_scalar_string};

use crate::error::{Error, Result};
use crate::path::DEVICES_ROOT;

const ROLLBACK_PATH: &str = "tailf-rollback:rollback-files/apply-rollback-file";

const COMMIT_APPLIED: &str = "Configuration successfully applied to devices";
const ROLLBACK_APPLIED: &str = "Rollback operation completed successfully";
const NO_CHANGES: &str = "No changes detected - configuration is already in desired state";
const NO_ROLLBACK_CHANGES: &str =
    "No rollback changes detected - rollback would not modify any configuration";

/// Result of [`commit`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub id: String,
    pub result: String,
    /// Rollback file recorded for the commit; 0 when the store reported none
    pub rollback_id: u64,
}

/// Result of a dry-run or rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub id: String,
    pub result: String,
}

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Wrap `config` as a devices-root payload, unwrapping an existing wrapper.
fn devices_body(config: &Value) -> Value {
    let devices = config.get(DEVICES_ROOT).unwrap_or(config);
    json!({ DEVICES_ROOT: devices })
}

/// Apply `config` to the device tree and capture the rollback id.
pub fn commit(client: &dyn RemoteClient, config: &Value) -> Result<CommitOutcome> {
    let path = format!("{}?rollback-id=true", DEVICES_ROOT);
    debug!(%path, "beginning commit");

    let res = client
        .patch(&path, &devices_body(config))
        .map_err(|e| Error::remote(&path, "commit", e))?;

    let result = if is_blank(&res.body) {
        COMMIT_APPLIED.to_string()
    } else {
        pretty(&res.body)
    };
    let rollback_id = get(&res.body, "tailf-restconf:result.rollback.id")
        .and_then(|v| to_scalar_string(v).parse().ok())
        .unwrap_or(0);

    debug!(rollback_id, "commit finished");
    Ok(CommitOutcome {
        id: format!("commit-{}", unix_now()),
        result,
        rollback_id,
    })
}

/// Preview what [`commit`] would change without applying it.
pub fn commit_dry_run(client: &dyn RemoteClient, config: &Value) -> Result<ActionOutcome> {
    let path = format!("{}?dry-run=cli-c", DEVICES_ROOT);
    debug!(%path, "beginning dry-run");

    let res = client
        .patch(&path, &devices_body(config))
        .map_err(|e| Error::remote(&path, "dry-run", e))?;

    let diff = [
        "dry-run-result.cli.local-node.data",
        "dry-run-result.cli-c.local-node.data",
        "dry-run-result.result-xml.local-node.data",
    ]
    .iter()
    .find_map(|expr| get(&res.body, expr).map(to_scalar_string));

    let result = match diff {
        Some(diff) if diff.is_empty() => NO_CHANGES.to_string(),
        Some(diff) => format!(
            "=== Dry-Run Diff - Configuration Changes Preview ===\n\
             The following shows what would be applied to the devices:\n\
             (+ indicates additions, - indicates deletions)\n\n{}",
            diff
        ),
        None => pretty(&res.body),
    };

    Ok(ActionOutcome {
        id: format!("dry-run-{}", unix_now()),
        result,
    })
}

fn rollback_body(id: u64, dry_run: bool) -> Value {
    let mut input = json!({ "fixed-number": id.to_string() });
    if dry_run {
        input["tailf-ncs-rollback:dry-run"] = json!({ "outformat": "cli-c" });
    }
    json!({ "tailf-rollback:input": input })
}

/// Whether a failed rollback request names a rollback that does not exist.
fn is_missing_rollback(err: &ClientError) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("rollback")
        && (message.contains("not found") || message.contains("does not exist"))
}

fn post_rollback(client: &dyn RemoteClient, id: u64, dry_run: bool) -> Result<Value> {
    let operation = if dry_run { "rollback dry-run" } else { "rollback" };
    debug!(rollback = id, operation, "beginning rollback");

    client
        .post(ROLLBACK_PATH, &rollback_body(id, dry_run))
        .map(|res| res.body)
        .map_err(|e| {
            if is_missing_rollback(&e) {
                Error::RollbackNotFound { id }
            } else {
                Error::remote(ROLLBACK_PATH, operation, e)
            }
        })
}

/// Restore the configuration recorded as rollback `id`.
pub fn rollback(client: &dyn RemoteClient, id: u64) -> Result<ActionOutcome> {
    let body = post_rollback(client, id, false)?;

    let result = match body.get("tailf-rollback:output") {
        Some(output) => pretty(output),
        None if is_blank(&body) => ROLLBACK_APPLIED.to_string(),
        None => pretty(&body),
    };

    Ok(ActionOutcome {
        id: format!("rollback-{}-{}", id, unix_now()),
        result,
    })
}

/// Preview what [`rollback`] would change without applying it.
pub fn rollback_dry_run(client: &dyn RemoteClient, id: u64) -> Result<ActionOutcome> {
    let body = post_rollback(client, id, true)?;

    let result = match get(&body, "tailf-rollback:output.cli-c.local-node.data") {
        Some(data) => {
            let data = to_scalar_string(data);
            if data.is_empty() {
                NO_ROLLBACK_CHANGES.to_string()
            } else {
                format!(
                    "=== Rollback Dry-Run Result ===\n\
                     The following configuration would be applied during rollback:\n\n{}",
                    data
                )
            }
        }
        None => pretty(&body),
    };

    Ok(ActionOutcome {
        id: format!("rollback-dry-run-{}-{}", id, unix_now()),
        result,
    })
}
