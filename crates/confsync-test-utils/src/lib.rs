//! Shared test utilities for the confsync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`recording`]: [`RecordingClient`], a store that logs every call and
//!   can be scripted to fail
//! - [`fixtures`]: store trees and list items
//! - [`workspace`]: [`TestWorkspace`], a temporary directory with a
//!   `confsync.toml` and a file-backed store

pub mod fixtures;
pub mod recording;
pub mod workspace;

pub use recording::{Call, RecordingClient};
pub use workspace::TestWorkspace;
