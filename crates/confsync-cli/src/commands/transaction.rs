//! Commit and rollback commands

use std::path::Path;

use colored::Colorize;
use serde_json::Value;

use confsync_core::{commit, commit_dry_run, rollback, rollback_dry_run};

use crate::context::Context;
use crate::error::Result;

/// Commit the device-tree configuration in `file`.
pub fn run_commit(
    ctx: &Context,
    file: &Path,
    instance: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config: Value = ctx.definitions.load(file)?;
    let client = ctx.reconciler.client(instance)?;

    if dry_run {
        let outcome = commit_dry_run(client, &config)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("{}", outcome.result);
        }
        return Ok(());
    }

    let outcome = commit(client, &config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{} {}", "Committed".green().bold(), outcome.id);
    if outcome.rollback_id > 0 {
        println!(
            "Undo with {}",
            format!("confsync rollback {}", outcome.rollback_id).cyan()
        );
    }
    println!();
    println!("{}", outcome.result);
    Ok(())
}

/// Apply, or preview, rollback `id`.
pub fn run_rollback(
    ctx: &Context,
    id: u64,
    instance: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let client = ctx.reconciler.client(instance)?;
    let outcome = if dry_run {
        rollback_dry_run(client, id)?
    } else {
        rollback(client, id)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        if !dry_run {
            println!("{} {}", "Rolled back".green().bold(), outcome.id);
            println!();
        }
        println!("{}", outcome.result);
    }
    Ok(())
}
