//! Dual-index search engine (spec §4.3, §4.4): BM25 keyword index, pluggable
//! dense vector index, and reciprocal-rank fusion across both (plus the
//! enrichment-text vector list when present).

pub mod bm25;
pub mod fusion;
pub mod tokenize;
pub mod vector;

pub use bm25::Bm25Index;
pub use fusion::reciprocal_rank_fusion;
pub use tokenize::tokenize;
pub use vector::{EmbeddingProvider, VectorIndex};
