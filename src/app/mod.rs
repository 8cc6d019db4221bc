//! Indexing and retrieval applications (spec §4.8, §4.9): orchestration
//! grounded on the original's `application/services/{repository_services,
//! commit_processing_services}.py` for indexing and `retreival/service.py`
//! for retrieval, generalised to the full three-list fusion spec §4.9's
//! resolved open question calls for.

pub mod handlers;
pub mod indexing;
pub mod retrieval;

pub use handlers::{
    register_default_handlers, CommitExtractHandler, RepositoryIndexHandler, SnippetEmbedHandler, SnippetEnrichHandler,
};
pub use indexing::IndexingApplication;
pub use retrieval::{RetrievalApplication, ScoredSnippet};
