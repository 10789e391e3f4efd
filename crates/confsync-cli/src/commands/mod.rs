//! Command implementations for confsync-cli

pub mod body;
pub mod lifecycle;
pub mod show;
pub mod transaction;

pub use body::{run_body, run_diff};
pub use lifecycle::{run_apply, run_destroy, run_import, run_refresh};
pub use show::run_show;
pub use transaction::{run_commit, run_rollback};
