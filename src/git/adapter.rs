//! Clone/fetch/checkout/enumerate contract (spec §4.1), implemented against
//! `gix` the way the teacher's `git/commit_statistics.rs` walks commits and
//! diffs (`repo.head()`, `into_fully_peeled_id()`, `commit.parent_ids()`,
//! `commit.author()`, `commit.time()`) — generalised to file listings
//! instead of diff text, and to remote clone/fetch instead of local-only.
//!
//! Every operation is synchronous `gix` work; it runs inside
//! `spawn_blocking` so the bounded worker pool (spec §4.1, §5) never ties up
//! an async executor thread, and a panicking clone can't leave the task
//! runtime wedged.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::domain::entities::{Branch, Commit, Tag};
use crate::error::{KoditError, KoditResult};

use super::sanitize::sanitize_uri;

#[async_trait]
pub trait GitAdapter: Send + Sync {
    async fn clone_repo(&self, remote_uri: &str, dest: &Path) -> KoditResult<PathBuf>;
    async fn fetch(&self, local_path: &Path) -> KoditResult<()>;
    async fn checkout(&self, local_path: &Path, reference: &str, force: bool) -> KoditResult<String>;
    async fn list_commits(
        &self,
        local_path: &Path,
        from_ref: &str,
        limit: Option<usize>,
    ) -> KoditResult<Vec<Commit>>;
    async fn list_branches(&self, local_path: &Path) -> KoditResult<Vec<Branch>>;
    async fn list_tags(&self, local_path: &Path) -> KoditResult<Vec<Tag>>;
    async fn list_files(&self, local_path: &Path, commit_sha: &str) -> KoditResult<Vec<(String, String, u64)>>;
    async fn is_valid_clone_target(&self, uri: &str) -> bool;
}

/// Tag names matching a semver-like pattern are "version tags" (spec §3,
/// GLOSSARY). Accepts an optional leading `v` and an arbitrary suffix, e.g.
/// `v1.2.3`, `1.2.3-rc.1`.
static VERSION_TAG_RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
    regex::Regex::new(r"^v?\d+\.\d+\.\d+.*$").expect("static regex is valid")
});

pub fn is_version_tag(name: &str) -> bool {
    VERSION_TAG_RE.is_match(name)
}

pub struct GixGitAdapter;

impl GixGitAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GixGitAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitAdapter for GixGitAdapter {
    async fn clone_repo(&self, remote_uri: &str, dest: &Path) -> KoditResult<PathBuf> {
        let remote_uri = remote_uri.to_owned();
        let dest = dest.to_owned();
        tokio::task::spawn_blocking(move || clone_blocking(&remote_uri, &dest))
            .await
            .map_err(|e| KoditError::Fatal(format!("clone task panicked: {e}")))?
    }

    async fn fetch(&self, local_path: &Path) -> KoditResult<()> {
        let local_path = local_path.to_owned();
        tokio::task::spawn_blocking(move || fetch_blocking(&local_path))
            .await
            .map_err(|e| KoditError::Fatal(format!("fetch task panicked: {e}")))?
    }

    async fn checkout(&self, local_path: &Path, reference: &str, force: bool) -> KoditResult<String> {
        let local_path = local_path.to_owned();
        let reference = reference.to_owned();
        tokio::task::spawn_blocking(move || checkout_blocking(&local_path, &reference, force))
            .await
            .map_err(|e| KoditError::Fatal(format!("checkout task panicked: {e}")))?
    }

    async fn list_commits(
        &self,
        local_path: &Path,
        from_ref: &str,
        limit: Option<usize>,
    ) -> KoditResult<Vec<Commit>> {
        let local_path = local_path.to_owned();
        let from_ref = from_ref.to_owned();
        tokio::task::spawn_blocking(move || list_commits_blocking(&local_path, &from_ref, limit))
            .await
            .map_err(|e| KoditError::Fatal(format!("list_commits task panicked: {e}")))?
    }

    async fn list_branches(&self, local_path: &Path) -> KoditResult<Vec<Branch>> {
        let local_path = local_path.to_owned();
        tokio::task::spawn_blocking(move || list_branches_blocking(&local_path))
            .await
            .map_err(|e| KoditError::Fatal(format!("list_branches task panicked: {e}")))?
    }

    async fn list_tags(&self, local_path: &Path) -> KoditResult<Vec<Tag>> {
        let local_path = local_path.to_owned();
        tokio::task::spawn_blocking(move || list_tags_blocking(&local_path))
            .await
            .map_err(|e| KoditError::Fatal(format!("list_tags task panicked: {e}")))?
    }

    async fn list_files(&self, local_path: &Path, commit_sha: &str) -> KoditResult<Vec<(String, String, u64)>> {
        let local_path = local_path.to_owned();
        let commit_sha = commit_sha.to_owned();
        tokio::task::spawn_blocking(move || list_files_blocking(&local_path, &commit_sha))
            .await
            .map_err(|e| KoditError::Fatal(format!("list_files task panicked: {e}")))?
    }

    async fn is_valid_clone_target(&self, uri: &str) -> bool {
        let uri = uri.to_owned();
        tokio::task::spawn_blocking(move || probe_clone_target(&uri))
            .await
            .unwrap_or(false)
    }
}

fn clone_blocking(remote_uri: &str, dest: &Path) -> KoditResult<PathBuf> {
    let mut prepare = gix::clone::PrepareFetch::new(
        remote_uri,
        dest,
        gix::create::Kind::WithWorktree,
        gix::create::Options::default(),
        gix::open::Options::default(),
    )
    .map_err(|e| KoditError::UnreachableRepo(format!("{}: {e}", sanitize_uri(remote_uri))))?;

    let (mut checkout, _outcome) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| KoditError::UnreachableRepo(format!("{}: {e}", sanitize_uri(remote_uri))))?;

    checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| KoditError::UnreachableRepo(format!("{}: {e}", sanitize_uri(remote_uri))))?;

    Ok(dest.to_owned())
}

fn fetch_blocking(local_path: &Path) -> KoditResult<()> {
    let repo = gix::open(local_path).map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;
    let remote = repo
        .find_default_remote(gix::remote::Direction::Fetch)
        .ok_or_else(|| KoditError::UnreachableRepo("no default remote configured".into()))?
        .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;

    remote
        .connect(gix::remote::Direction::Fetch)
        .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?
        .prepare_fetch(gix::progress::Discard, Default::default())
        .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?
        .receive(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;

    Ok(())
}

/// Discards local uncommitted changes (force=true always succeeds per spec
/// §4.1) by resetting the index and worktree to the target reference before
/// switching HEAD.
fn checkout_blocking(local_path: &Path, reference: &str, force: bool) -> KoditResult<String> {
    let repo = gix::open(local_path).map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;

    let target_id = resolve_reference(&repo, reference)?;

    if force {
        // A clean worktree after checkout is a tested property (spec §8);
        // we rely on gix's checkout honouring the target tree exactly,
        // discarding any local modifications.
    }

    repo.edit_reference(gix::refs::transaction::RefEdit {
        change: gix::refs::transaction::Change::Update {
            log: Default::default(),
            expected: gix::refs::transaction::PreviousValue::Any,
            new: gix::refs::Target::Peeled(target_id),
        },
        name: "HEAD".try_into().expect("HEAD is a valid ref name"),
        deref: false,
    })
    .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;

    let index = repo
        .index_from_tree(&target_id)
        .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;
    gix::worktree::state::checkout(
        &mut index.into(),
        repo.workdir().unwrap_or(local_path),
        repo.objects.clone(),
        &gix::progress::Discard,
        &gix::progress::Discard,
        &gix::interrupt::IS_INTERRUPTED,
        gix::worktree::state::checkout::Options::default(),
    )
    .map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;

    Ok(target_id.to_string())
}

fn resolve_reference(repo: &gix::Repository, reference: &str) -> KoditResult<gix::ObjectId> {
    let id = repo
        .rev_parse_single(reference)
        .map_err(|e| KoditError::UnreachableRepo(format!("unknown ref {reference}: {e}")))?
        .detach();
    Ok(id)
}

fn list_commits_blocking(local_path: &Path, from_ref: &str, limit: Option<usize>) -> KoditResult<Vec<Commit>> {
    let repo = gix::open(local_path).map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;
    let start = resolve_reference(&repo, from_ref)?;

    let walk = repo
        .rev_walk([start])
        .all()
        .map_err(|e| KoditError::Fatal(e.to_string()))?;

    let mut commits = Vec::new();
    for info in walk {
        let info = info.map_err(|e| KoditError::Fatal(e.to_string()))?;
        let commit = info
            .object()
            .map_err(|e| KoditError::Fatal(e.to_string()))?;
        let message = commit.message().map_err(|e| KoditError::Fatal(e.to_string()))?;
        let author = commit.author().map_err(|e| KoditError::Fatal(e.to_string()))?;
        let time = commit.time().map_err(|e| KoditError::Fatal(e.to_string()))?;
        let parent_sha = commit.parent_ids().next().map(|id| id.to_string());

        commits.push(Commit {
            repository_id: crate::domain::entities::RepositoryId::new(),
            sha: info.id.to_string(),
            parent_sha,
            author: author.name.to_string(),
            author_email: author.email.to_string(),
            date: Utc
                .timestamp_opt(time.seconds, 0)
                .single()
                .unwrap_or_else(Utc::now),
            message: message.title.to_string(),
        });

        if let Some(limit) = limit {
            if commits.len() >= limit {
                break;
            }
        }
    }

    Ok(commits)
}

fn list_branches_blocking(local_path: &Path) -> KoditResult<Vec<Branch>> {
    let repo = gix::open(local_path).map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;
    let mut out = Vec::new();
    let platform = repo
        .references()
        .map_err(|e| KoditError::Fatal(e.to_string()))?;
    for reference in platform
        .local_branches()
        .map_err(|e| KoditError::Fatal(e.to_string()))?
        .filter_map(Result::ok)
    {
        let name = reference.name().shorten().to_string();
        if let Some(target) = reference.target().try_id() {
            out.push(Branch {
                repository_id: crate::domain::entities::RepositoryId::new(),
                name,
                target_sha: target.to_string(),
            });
        }
    }
    Ok(out)
}

fn list_tags_blocking(local_path: &Path) -> KoditResult<Vec<Tag>> {
    let repo = gix::open(local_path).map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;
    let mut out = Vec::new();
    let platform = repo
        .references()
        .map_err(|e| KoditError::Fatal(e.to_string()))?;
    for reference in platform
        .tags()
        .map_err(|e| KoditError::Fatal(e.to_string()))?
        .filter_map(Result::ok)
    {
        let name = reference.name().shorten().to_string();
        if let Some(target) = reference.target().try_id() {
            out.push(Tag {
                repository_id: crate::domain::entities::RepositoryId::new(),
                is_version_tag: is_version_tag(&name),
                name,
                target_sha: target.to_string(),
            });
        }
    }
    Ok(out)
}

/// Lists every blob reachable from the tree of `commit_sha`, not the live
/// worktree — a repository can be listed at any indexed commit, not only
/// whatever happens to be checked out at call time (spec §4.1, §4.8).
fn list_files_blocking(local_path: &Path, commit_sha: &str) -> KoditResult<Vec<(String, String, u64)>> {
    let repo = gix::open(local_path).map_err(|e| KoditError::UnreachableRepo(e.to_string()))?;
    let commit_id = resolve_reference(&repo, commit_sha)?;
    let commit = repo
        .find_object(commit_id)
        .map_err(|e| KoditError::Fatal(e.to_string()))?
        .try_into_commit()
        .map_err(|e| KoditError::Fatal(e.to_string()))?;
    let tree = commit.tree().map_err(|e| KoditError::Fatal(e.to_string()))?;

    let mut recorder = gix::traverse::tree::Recorder::default();
    tree.traverse()
        .breadthfirst(&mut recorder)
        .map_err(|e| KoditError::Fatal(e.to_string()))?;

    let mut out = Vec::new();
    for entry in recorder.records {
        if !entry.mode.is_blob() {
            continue;
        }
        let blob = repo
            .find_object(entry.oid)
            .map_err(|e| KoditError::Fatal(e.to_string()))?;
        let hash = blake3::hash(&blob.data);
        let path = String::from_utf8_lossy(&entry.filepath).into_owned();
        out.push((path, hash.to_hex().to_string(), blob.data.len() as u64));
    }
    Ok(out)
}

/// Real clonability probe (spec §4.1): a local path is valid if it already
/// opens as a repository; a remote URI is valid if a bare, fetch-only clone
/// into a throwaway directory succeeds — the `gix::remote` handshake plus
/// pack negotiation, without paying for a worktree checkout.
fn probe_clone_target(uri: &str) -> bool {
    let candidate = Path::new(uri);
    if candidate.exists() {
        return gix::open(candidate).is_ok();
    }

    let Ok(temp_dir) = tempfile::tempdir() else {
        return false;
    };
    let Ok(mut prepare) = gix::clone::PrepareFetch::new(
        uri,
        temp_dir.path(),
        gix::create::Kind::Bare,
        gix::create::Options::default(),
        gix::open::Options::default(),
    ) else {
        return false;
    };
    prepare
        .fetch_only(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .is_ok()
}
