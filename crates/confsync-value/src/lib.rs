//! Structured value codec for confsync
//!
//! Reads, navigates and writes generic `serde_json::Value` trees using
//! dot-separated path expressions, including the array filter form used to
//! address keyed list entries (`rule.#(id=="10").action`).

pub mod error;
pub mod path;
pub mod tree;

pub use error::{Error, Result};
pub use path::{PathSegment, escape_key, filter_segment, parse_path, slash_to_dotted};
pub use tree::{exists, get, is_empty_leaf, set, set_raw, to_scalar_string};
