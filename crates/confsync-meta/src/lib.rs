//! Settings and definition loading for confsync.
//!
//! - [`Settings`]: the `confsync.toml` file naming store instances and the
//!   reconcile strategy
//! - [`DefinitionStore`]: format-agnostic loading and saving of node
//!   definitions and state files (TOML, JSON, YAML)

pub mod definitions;
pub mod error;
pub mod settings;

pub use definitions::{DefinitionStore, MAX_DEFINITION_SIZE};
pub use error::{Error, Result};
pub use settings::{
    DEFAULT_SETTINGS_FILE, DeleteMode, InstanceSettings, ReconcileSettings, Settings, WriteMode,
};
