//! Indexing orchestrator (spec §4.8): acquire → enumerate commits →
//! extract → persist → fan out embedding/enrichment work, per-commit
//! idempotent.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::chunking::{self, languages::TSLanguageParsing};
use crate::domain::entities::{
    Commit, File as FileEntity, Repository, RepositoryId, RepositoryStatusSummary, Snippet, SnippetId, TaskType,
    TrackingRef,
};
use crate::error::{KoditError, KoditResult};
use crate::git::{sanitize_uri, GitAdapter};
use crate::progress::StepTree;
use crate::queue::Dispatcher;
use crate::repositories::{CommitRepository, FileRepository, RepositoryRepository, SnippetRepository, TaskStatusRepository};
use crate::search::Bm25Index;

/// Newer commits not yet indexed for a repository are enqueued as
/// `commit.extract` tasks, up to this many per index run when no explicit
/// limit is configured (spec §4.8 step 3: "default: HEAD only").
const DEFAULT_COMMIT_BACKFILL_LIMIT: usize = 1;

/// Name of the top-level step an index run is tracked under (spec §4.7,
/// §4.9 ADD): the trackable reference is the repository's sanitized URI, so
/// looking up status by this name plus that URI is how a status summary is
/// built.
pub const ROOT_STEP_NAME: &str = "kodit.index.run";

/// Aggregates a repository's recorded progress steps plus its live pending
/// task count into the status view the HTTP surface exposes (spec §3/§4.9
/// ADD).
pub async fn repository_status_summary(
    task_status: &TaskStatusRepository,
    dispatcher: &Dispatcher,
    repository: &Repository,
) -> KoditResult<RepositoryStatusSummary> {
    let steps = task_status.list_for_trackable("repository", &repository.uri).await?;
    let pending_tasks = dispatcher.count_pending_matching(&repository.id.0.to_string()).await?;
    Ok(RepositoryStatusSummary { steps, pending_tasks })
}

pub struct IndexingApplication {
    git: Arc<dyn GitAdapter>,
    clones_dir: PathBuf,
    languages: Arc<TSLanguageParsing>,
    repositories: RepositoryRepository,
    commits: CommitRepository,
    files: FileRepository,
    snippets: SnippetRepository,
    dispatcher: Arc<Dispatcher>,
    progress: StepTree,
    bm25: Arc<Bm25Index>,
}

impl IndexingApplication {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        git: Arc<dyn GitAdapter>,
        clones_dir: PathBuf,
        languages: Arc<TSLanguageParsing>,
        repositories: RepositoryRepository,
        commits: CommitRepository,
        files: FileRepository,
        snippets: SnippetRepository,
        dispatcher: Arc<Dispatcher>,
        progress: StepTree,
        bm25: Arc<Bm25Index>,
    ) -> Self {
        Self {
            git,
            clones_dir,
            languages,
            repositories,
            commits,
            files,
            snippets,
            dispatcher,
            progress,
            bm25,
        }
    }

    /// Algorithm (spec §4.8): resolve/create, acquire, checkout tracked
    /// ref, enumerate unindexed commits, enqueue `commit.extract`.
    pub async fn index_repository(&self, uri: &str) -> KoditResult<Repository> {
        let sanitized = sanitize_uri(uri);
        let step = self.progress.root(ROOT_STEP_NAME, "repository", &sanitized);

        step.run(|step| async move {
            let mut repository = match self.repositories.find_by_uri(&sanitized).await? {
                Some(existing) => existing,
                None => Repository {
                    id: RepositoryId::new(),
                    uri: sanitized.clone(),
                    cloned_path: self.clones_dir.join(repo_dir_name(&sanitized)).to_string_lossy().to_string(),
                    tracking_ref: TrackingRef::LatestTag,
                    tracked_head: None,
                    last_scanned_at: None,
                    created_at: Utc::now(),
                },
            };

            let acquire_step = step.child("acquire");
            acquire_step.run(|_| self.acquire(uri, &repository)).await?;

            let checkout_step = step.child("checkout");
            let target_head = checkout_step
                .run(|_| self.checkout_tracked(&repository))
                .await?;
            repository.tracked_head = Some(target_head.clone());
            repository.last_scanned_at = Some(Utc::now());
            self.repositories.upsert(&repository).await?;

            let enumerate_step = step.child("enumerate_commits");
            let new_commits = enumerate_step
                .run(|_| self.enumerate_unindexed_commits(&repository, &target_head))
                .await?;

            for (priority, commit) in new_commits.iter().rev().enumerate() {
                // Newest gets the highest priority (spec §4.8 step 3).
                let priority = (new_commits.len() - priority) as i64;
                self.dispatcher
                    .enqueue(crate::domain::entities::Task::new(
                        TaskType::CommitExtract,
                        format!("commit.extract:{}:{}", repository.id.0, commit.sha),
                        priority,
                        serde_json::to_value(commit)?,
                    ))
                    .await?;
            }

            Ok(repository)
        })
        .await
    }

    async fn acquire(&self, uri: &str, repository: &Repository) -> KoditResult<()> {
        let dest = PathBuf::from(&repository.cloned_path);
        if dest.exists() {
            self.git.fetch(&dest).await
        } else {
            self.git.clone_repo(uri, &dest).await.map(|_| ())
        }
    }

    async fn checkout_tracked(&self, repository: &Repository) -> KoditResult<String> {
        let dest = PathBuf::from(&repository.cloned_path);
        let reference = match &repository.tracking_ref {
            TrackingRef::Branch(name) => name.clone(),
            TrackingRef::LatestTag => self.latest_version_tag(&dest).await?,
        };
        self.git.checkout(&dest, &reference, true).await
    }

    async fn latest_version_tag(&self, dest: &PathBuf) -> KoditResult<String> {
        let tags = self.git.list_tags(dest).await?;
        tags.into_iter()
            .filter(|tag| tag.is_version_tag)
            .max_by(|a, b| a.name.cmp(&b.name))
            .map(|tag| tag.name)
            .ok_or_else(|| KoditError::UnreachableRepo("no version tags found".into()))
    }

    /// Commits reachable from `target_head` not yet indexed for this
    /// repository, newest first, bounded by the configured backfill limit.
    async fn enumerate_unindexed_commits(&self, repository: &Repository, target_head: &str) -> KoditResult<Vec<Commit>> {
        let dest = PathBuf::from(&repository.cloned_path);
        let candidates = self
            .git
            .list_commits(&dest, target_head, Some(DEFAULT_COMMIT_BACKFILL_LIMIT * 50))
            .await?;

        let mut out = Vec::new();
        for mut commit in candidates {
            commit.repository_id = repository.id;
            if self.commits.is_indexed(repository.id, &commit.sha).await? {
                break;
            }
            out.push(commit);
            if out.len() >= DEFAULT_COMMIT_BACKFILL_LIMIT {
                break;
            }
        }
        Ok(out)
    }

    /// Extract step (spec §4.8 step 4): list files, filter, detect
    /// language, slice snippets, persist atomically, fan out embed/enrich.
    /// Takes the fully populated `Commit` enumerated upstream rather than
    /// just its sha, so the persisted row carries real author/date/message
    /// instead of placeholders (spec §3: Commit attributes = parent SHA,
    /// author, date, message).
    pub async fn extract_commit(&self, commit: Commit) -> KoditResult<()> {
        let repository_id = commit.repository_id;
        let commit_sha = commit.sha.clone();
        let Some(repository) = self.repositories.get(repository_id).await? else {
            return Err(KoditError::Fatal(format!("unknown repository {}", repository_id.0)));
        };

        let step = self
            .progress
            .root("kodit.index.extract_commit", "commit", &format!("{}:{commit_sha}", repository_id.0));

        step.run(|step| async move {
            self.commits.upsert(&commit).await?;

            let dest = PathBuf::from(&repository.cloned_path);
            let files = self.git.list_files(&dest, &commit_sha).await?;
            step.set_progress(0, files.len() as u64);

            let mut file_entities = Vec::with_capacity(files.len());
            let mut all_snippets = Vec::new();
            let mut unparseable = 0usize;

            for (idx, (path, sha256, size)) in files.into_iter().enumerate() {
                file_entities.push(FileEntity {
                    repository_id,
                    commit_sha: commit_sha.clone(),
                    path: path.clone(),
                    content_sha256: sha256,
                    mime: mime_guess_for(&path),
                    size,
                    author_name: Some(commit.author.clone()),
                    author_email: if commit.author_email.is_empty() {
                        None
                    } else {
                        Some(commit.author_email.clone())
                    },
                });

                match chunking::detect_language(&path) {
                    Ok(Some(language)) => {
                        let Some(config) = self.languages.for_language(language) else {
                            continue;
                        };
                        let Ok(bytes) = std::fs::read(dest.join(&path)) else {
                            continue;
                        };
                        match chunking::extract(&bytes, config) {
                            chunking::ExtractOutcome::Snippets(snippets) => {
                                for snippet in snippets {
                                    let id = SnippetId::of(&snippet.text, &path, language);
                                    all_snippets.push(Snippet {
                                        id,
                                        repository_id,
                                        commit_sha: commit_sha.to_owned(),
                                        file_path: path.clone(),
                                        language: language.to_owned(),
                                        text: snippet.text,
                                        enrichment_summary: None,
                                    });
                                }
                            }
                            chunking::ExtractOutcome::Unparseable => {
                                unparseable += 1;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(_) => {}
                }

                step.set_progress(idx as u64 + 1, file_entities.len() as u64);
            }

            if unparseable > 0 {
                step.set_message(format!("{unparseable} file(s) could not be parsed"));
            }

            // A commit's extract is the unit of atomicity (spec §4.8):
            // either all its snippets are committed, or none (errors from
            // here on propagate and neither replace call has run).
            self.files.replace_for_commit(repository_id, commit_sha, &file_entities).await?;
            self.snippets.replace_for_commit(repository_id, commit_sha, &all_snippets).await?;

            // BM25 reflects every tracked repository's current head, not just
            // this commit (spec §4.3) — rebuilding here keeps keyword search
            // atomic with extraction without losing other repositories' docs.
            let live_corpus = self.snippets.list_at_tracked_heads().await?;
            self.bm25.rebuild(live_corpus.into_iter().map(|s| (s.id, s.text)).collect())?;

            if !all_snippets.is_empty() {
                let snippet_ids: Vec<String> = all_snippets.iter().map(|s| s.id.to_hex()).collect();
                self.dispatcher
                    .enqueue(crate::domain::entities::Task::new(
                        TaskType::SnippetEmbed,
                        format!("snippet.embed:{}:{}", repository_id.0, commit_sha),
                        5,
                        json!({ "snippet_ids": snippet_ids }),
                    ))
                    .await?;
                self.dispatcher
                    .enqueue(crate::domain::entities::Task::new(
                        TaskType::SnippetEnrich,
                        format!("snippet.enrich:{}:{}", repository_id.0, commit_sha),
                        1,
                        json!({ "snippet_ids": snippet_ids }),
                    ))
                    .await?;
            }

            Ok(())
        })
        .await
    }
}

fn repo_dir_name(sanitized_uri: &str) -> String {
    let hash = blake3::hash(sanitized_uri.as_bytes());
    hash.to_hex().to_string()
}

fn mime_guess_for(path: &str) -> String {
    match chunking::detect_language(path) {
        Ok(Some(_)) => "text/plain".to_owned(),
        _ => "application/octet-stream".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_dir_name_is_deterministic() {
        assert_eq!(repo_dir_name("https://host/a"), repo_dir_name("https://host/a"));
        assert_ne!(repo_dir_name("https://host/a"), repo_dir_name("https://host/b"));
    }
}
