//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use confsync_core::NodeRoot;

/// confsync - reconcile declared device configuration with a RESTCONF store
#[derive(Parser, Debug)]
#[command(name = "confsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ./confsync.toml)
    #[arg(short, long, global = true, env = "CONFSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the write body of a node definition
    Body {
        /// Node definition (.toml, .json, .yaml)
        node: PathBuf,
    },

    /// List the deletions applying a plan over a state would issue
    Diff {
        /// Desired node definition
        plan: PathBuf,

        /// Previously applied state
        state: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Create or update a node in its store
    ///
    /// Without a state file the node is created. With one, the node is
    /// updated against the recorded state and the file is rewritten.
    ///
    /// Examples:
    ///   confsync apply svc.toml
    ///   confsync apply svc.toml --state svc.state.json
    Apply {
        /// Node definition
        node: PathBuf,

        /// State file to update against and write back
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Re-read a recorded state from its store
    Refresh {
        /// State file, rewritten in place
        state: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Remove a node's configuration and its state file
    Destroy {
        /// State file
        state: PathBuf,
    },

    /// Show every attribute stored below a device path
    ///
    /// Examples:
    ///   confsync show -d ce0 -p svc
    ///   confsync show -d edge --root device-group
    Show {
        /// Device or device-group name
        #[arg(short, long)]
        device: String,

        /// Path below the root
        #[arg(short, long)]
        path: Option<String>,

        /// Anchor of the path: device-config, device or device-group
        #[arg(short, long, default_value = "device-config")]
        root: NodeRoot,

        /// Instance to read from
        #[arg(short, long)]
        instance: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Start tracking an existing path
    ///
    /// Examples:
    ///   confsync import tailf-ncs:devices/device=ce0/config/svc --state svc.state.json
    Import {
        /// Full node path
        id: String,

        /// Instance holding the path
        #[arg(short, long)]
        instance: Option<String>,

        /// State file to write
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Apply a device-tree configuration in one commit
    Commit {
        /// Configuration file (devices body, wrapped or bare)
        #[arg(value_name = "CONFIG")]
        file: PathBuf,

        /// Preview the changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Instance to commit to
        #[arg(short, long)]
        instance: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Restore the configuration recorded by a commit
    Rollback {
        /// Rollback id reported by commit
        id: u64,

        /// Preview the changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Instance to roll back
        #[arg(short, long)]
        instance: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
