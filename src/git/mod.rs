//! Git adapter (spec §4.1): clone/fetch/checkout, commit/branch/tag
//! enumeration, and URI sanitisation.

pub mod adapter;
pub mod sanitize;

pub use adapter::{is_version_tag, GitAdapter, GixGitAdapter};
pub use sanitize::sanitize_uri;
