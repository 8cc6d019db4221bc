//! Entities and lifecycle rules shared by every component (spec §3).

mod entities;

pub use entities::{
    Branch, Commit, Embedding, EmbeddingKind, File, Repository, RepositoryId, Snippet, SnippetId,
    StepState, Tag, Task, TaskStatus, TaskType,
};
