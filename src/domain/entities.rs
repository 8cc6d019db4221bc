//! Attribute shapes for spec §3's entities, generalised from `repo/types.rs`'s
//! hash-keyed identity newtype + state enum idiom (`RepoRef`/`SyncStatus`)
//! into the richer set kodit needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity = sanitized remote URI (credentials stripped), or an absolute
/// local path for folder-backed repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(pub Uuid);

impl RepositoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RepositoryId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a repository's indexing is pinned to: an explicit branch, or the
/// latest version tag (spec §2, §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TrackingRef {
    Branch(String),
    LatestTag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    /// Sanitized remote URI or local path; credentials never stored here.
    pub uri: String,
    pub cloned_path: String,
    pub tracking_ref: TrackingRef,
    pub tracked_head: Option<String>,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub repository_id: RepositoryId,
    pub sha: String,
    pub parent_sha: Option<String>,
    pub author: String,
    pub author_email: String,
    pub date: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub repository_id: RepositoryId,
    pub name: String,
    pub target_sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub repository_id: RepositoryId,
    pub name: String,
    pub target_sha: String,
    pub is_version_tag: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub repository_id: RepositoryId,
    pub commit_sha: String,
    pub path: String,
    pub content_sha256: String,
    pub mime: String,
    pub size: u64,
    /// Author of the commit that last touched this file (spec §3 ADD):
    /// an optional enrichment, not a full per-line blame history.
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// Identity = content hash over (normalized text, originating file,
/// language) — spec §3 invariant 1: identical content across commits shares
/// an embedding keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnippetId(pub [u8; 32]);

impl SnippetId {
    pub fn of(normalized_text: &str, file_path: &str, language: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(normalized_text.as_bytes());
        hasher.update(b"\0");
        hasher.update(file_path.as_bytes());
        hasher.update(b"\0");
        hasher.update(language.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(self) -> String {
        hex_encode(&self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub id: SnippetId,
    pub repository_id: RepositoryId,
    pub commit_sha: String,
    pub file_path: String,
    pub language: String,
    pub text: String,
    pub enrichment_summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    Code,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub snippet_id: SnippetId,
    pub kind: EmbeddingKind,
    pub vector: Vec<f32>,
}

/// Closed set of task types (spec §4.6); the dispatcher rejects anything
/// else as a fatal, non-retried error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RepositoryIndex,
    CommitExtract,
    SnippetEmbed,
    SnippetEnrich,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::RepositoryIndex => "repository.index",
            TaskType::CommitExtract => "commit.extract",
            TaskType::SnippetEmbed => "snippet.embed",
            TaskType::SnippetEnrich => "snippet.enrich",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "repository.index" => Some(TaskType::RepositoryIndex),
            "commit.extract" => Some(TaskType::CommitExtract),
            "snippet.embed" => Some(TaskType::SnippetEmbed),
            "snippet.enrich" => Some(TaskType::SnippetEnrich),
            _ => None,
        }
    }

    /// Per-type retry ceiling before the task is dropped and its owning step
    /// fails (spec §4.6).
    pub fn max_retries(self) -> u32 {
        match self {
            TaskType::RepositoryIndex => 5,
            TaskType::CommitExtract => 5,
            TaskType::SnippetEmbed => 8,
            TaskType::SnippetEnrich => 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub dedup_key: String,
    pub task_type: TaskType,
    pub priority: i64,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(task_type: TaskType, dedup_key: impl Into<String>, priority: i64, payload: serde_json::Value) -> Self {
        Self {
            dedup_key: dedup_key.into(),
            task_type,
            priority,
            payload,
            created_at: Utc::now(),
            retry_count: 0,
            next_retry_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Started,
    InProgress,
    Completed,
    Skipped,
    Failed,
}

impl StepState {
    /// Terminal states never regress (spec §3 invariant 4).
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Completed | StepState::Skipped | StepState::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub trackable_type: String,
    pub trackable_id: String,
    pub name: String,
    pub state: StepState,
    pub current: u64,
    pub total: u64,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Aggregate view of a repository's indexing progress (spec §3/§4.9 ADD):
/// every step recorded under the repository's trackable reference, plus
/// the live count of queued tasks still referencing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryStatusSummary {
    pub steps: Vec<TaskStatus>,
    pub pending_tasks: i64,
}
