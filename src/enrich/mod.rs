pub mod enricher;

pub use enricher::{clean_thinking_tags, Enricher};
