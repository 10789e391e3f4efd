//! Offline commands: body and diff
//!
//! Neither reads settings nor touches a store.

use std::path::Path;

use colored::Colorize;
use serde_json::json;

use confsync_core::{ConfigNode, build_body, detect_deletions};
use confsync_meta::DefinitionStore;

use crate::error::Result;

/// Print the merge-write body of the node defined at `node`.
pub fn run_body(node: &Path) -> Result<()> {
    let node: ConfigNode = DefinitionStore::new().load(node)?;
    let body = build_body(&node)?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Print the deletions an update from `state` to `plan` would issue.
pub fn run_diff(plan: &Path, state: &Path, json: bool) -> Result<()> {
    let definitions = DefinitionStore::new();
    let plan: ConfigNode = definitions.load(plan)?;
    let state: ConfigNode = definitions.load(state)?;
    let deletions = detect_deletions(&plan, &state);

    if json {
        let output = json!({
            "path": plan.path(),
            "has_changes": !deletions.is_empty(),
            "deletions": deletions,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if deletions.is_empty() {
        println!("{} No list entries removed.", "OK".green().bold());
        return Ok(());
    }

    println!("{} {}", "Diff".blue().bold(), plan.path().yellow());
    println!();
    for path in &deletions {
        println!("  {} {}", "-".red(), path);
    }
    println!();
    println!("{} deletion(s)", deletions.len());
    Ok(())
}
