//! Apply, refresh, destroy and import
//!
//! State files hold the node as last written or read, in any format the
//! definition loader accepts.

use std::fs;
use std::path::Path;

use colored::Colorize;
use serde_json::json;

use confsync_core::{ConfigNode, detect_deletions};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Create the node defined at `node`, or update it when `state` exists.
pub fn run_apply(ctx: &Context, node: &Path, state: Option<&Path>, json: bool) -> Result<()> {
    let plan: ConfigNode = ctx.definitions.load(node)?;
    let prior: Option<ConfigNode> = match state {
        Some(path) if path.exists() => Some(ctx.definitions.load(path)?),
        _ => None,
    };

    let (action, deletions, applied) = match &prior {
        Some(prior) => {
            if prior.path() != plan.path() || prior.instance_name() != plan.instance_name() {
                return Err(CliError::user(format!(
                    "state tracks {} but the definition resolves to {}; destroy the state first",
                    prior.path(),
                    plan.path()
                )));
            }
            let deletions = detect_deletions(&plan, prior);
            ("updated", deletions, ctx.reconciler.update(&plan, prior)?)
        }
        None => ("created", Vec::new(), ctx.reconciler.create(&plan)?),
    };

    if let Some(path) = state {
        ctx.definitions.save(path, &applied)?;
    }

    if json {
        let output = json!({
            "action": action,
            "id": applied.id,
            "deletions": deletions,
            "state": applied,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {} {}", "OK".green().bold(), action, applied.path().yellow());
    for path in &deletions {
        println!("  {} {}", "-".red(), path);
    }
    Ok(())
}

/// Re-read the state at `state` and write it back.
pub fn run_refresh(ctx: &Context, state: &Path, json: bool) -> Result<()> {
    let recorded: ConfigNode = ctx.definitions.load(state)?;
    let refreshed = ctx.reconciler.read(&recorded)?;
    ctx.definitions.save(state, &refreshed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&refreshed)?);
        return Ok(());
    }

    println!("{} {}", "Refreshed".blue().bold(), refreshed.path().yellow());
    let mut drifted = false;
    for (name, before) in &recorded.attributes {
        match refreshed.attributes.get(name) {
            Some(after) if after == before => {}
            Some(after) => {
                drifted = true;
                println!("  {} {}: {} -> {}", "~".yellow(), name, before, after);
            }
            None => {
                drifted = true;
                println!("  {} {} (gone)", "-".red(), name);
            }
        }
    }
    if recorded.lists != refreshed.lists {
        drifted = true;
        println!("  {} list entries changed", "~".yellow());
    }
    if !drifted {
        println!("  {}", "No drift".dimmed());
    }
    Ok(())
}

/// Delete the node recorded at `state` and remove the state file.
pub fn run_destroy(ctx: &Context, state: &Path) -> Result<()> {
    let recorded: ConfigNode = ctx.definitions.load(state)?;
    ctx.reconciler.delete(&recorded)?;
    fs::remove_file(state)?;

    if recorded.delete {
        println!("{} {}", "Destroyed".red().bold(), recorded.path());
    } else {
        println!(
            "{} {} (delete disabled, remote configuration kept)",
            "Untracked".yellow().bold(),
            recorded.path()
        );
    }
    Ok(())
}

/// Track the existing path `id` in a new state file.
pub fn run_import(ctx: &Context, id: &str, instance: Option<&str>, state: &Path) -> Result<()> {
    if state.exists() {
        return Err(CliError::user(format!(
            "{} already exists; refusing to overwrite",
            state.display()
        )));
    }

    let node = ctx.reconciler.import(id, instance)?;
    let present = ctx
        .reconciler
        .fetch(node.instance.as_deref(), &node.address())?;
    ctx.definitions.save(state, &node)?;

    println!("{} {}", "Imported".green().bold(), node.path().yellow());
    if present.is_empty() {
        println!("  {}", "Nothing is stored at this path yet".dimmed());
    } else {
        println!("  {} attribute(s) present; use {} to view them", present.len(), "confsync show".cyan());
    }
    Ok(())
}
