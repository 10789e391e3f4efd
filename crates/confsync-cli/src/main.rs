//! confsync CLI
//!
//! Applies node definitions to file-backed RESTCONF stores and tracks the
//! resulting state in local files.

mod cli;
mod commands;
mod context;
mod error;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use confsync_core::NodeAddress;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let builder = FmtSubscriber::builder().with_writer(std::io::stderr);
    let result = if verbose {
        builder
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .try_init()
    } else {
        builder
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
    };
    if result.is_ok() && verbose {
        tracing::debug!("Verbose mode enabled");
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.config.as_deref()),
        None => {
            println!("{} declarative device configuration", "confsync".green().bold());
            println!();
            println!("Run {} for available commands.", "confsync --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, config: Option<&Path>) -> Result<()> {
    match cmd {
        Commands::Body { node } => commands::run_body(&node),
        Commands::Diff { plan, state, json } => commands::run_diff(&plan, &state, json),
        Commands::Apply { node, state, json } => {
            let ctx = Context::load(config)?;
            commands::run_apply(&ctx, &node, state.as_deref(), json)
        }
        Commands::Refresh { state, json } => {
            let ctx = Context::load(config)?;
            commands::run_refresh(&ctx, &state, json)
        }
        Commands::Destroy { state } => {
            let ctx = Context::load(config)?;
            commands::run_destroy(&ctx, &state)
        }
        Commands::Show {
            device,
            path,
            root,
            instance,
            json,
        } => {
            let ctx = Context::load(config)?;
            let address = NodeAddress::new(root, device, path.as_deref());
            commands::run_show(&ctx, instance.as_deref(), &address, json)
        }
        Commands::Import {
            id,
            instance,
            state,
        } => {
            let ctx = Context::load(config)?;
            commands::run_import(&ctx, &id, instance.as_deref(), &state)
        }
        Commands::Commit {
            file,
            dry_run,
            instance,
            json,
        } => {
            let ctx = Context::load(config)?;
            commands::run_commit(&ctx, &file, instance.as_deref(), dry_run, json)
        }
        Commands::Rollback {
            id,
            dry_run,
            instance,
            json,
        } => {
            let ctx = Context::load(config)?;
            commands::run_rollback(&ctx, id, instance.as_deref(), dry_run, json)
        }
    }
}
