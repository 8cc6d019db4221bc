//! Repository index management routes (spec §6): `GET/POST/DELETE
//! /api/v1/indexes[/{id}]`, grounded on the teacher's `webserver/repos.rs`
//! route/response shape, generalised from the teacher's local-repo-backend
//! model to kodit's clone-backed `Repository` aggregate.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::indexing::repository_status_summary;
use crate::application::Application;
use crate::domain::entities::{RepositoryId, RepositoryStatusSummary, TaskType};
use crate::git::{GitAdapter, GixGitAdapter};
use crate::repositories::{RepositoryRepository, TaskStatusRepository};

use super::types::{json, ApiResponse, WebResult};

#[derive(Serialize)]
pub(crate) struct IndexView {
    pub id: Uuid,
    pub uri: String,
    pub tracked_head: Option<String>,
    pub last_scanned_at: Option<String>,
}

/// `IndexView` plus its live progress (spec §3/§4.9 ADD): flattened so the
/// response shape stays a single flat object rather than a nested envelope.
#[derive(Serialize)]
pub(crate) struct IndexDetailView {
    #[serde(flatten)]
    pub index: IndexView,
    pub status: RepositoryStatusSummary,
}

#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum IndexesResponse {
    List(Vec<IndexView>),
    Item(IndexDetailView),
    Created(IndexDetailView),
    Deleted,
}

impl ApiResponse for IndexesResponse {}

#[derive(Deserialize)]
pub(crate) struct CreateIndexRequest {
    pub uri: String,
}

fn to_view(repo: &crate::domain::entities::Repository) -> IndexView {
    IndexView {
        id: repo.id.0,
        uri: repo.uri.clone(),
        tracked_head: repo.tracked_head.clone(),
        last_scanned_at: repo.last_scanned_at.map(|t| t.to_rfc3339()),
    }
}

async fn to_detail_view(app: &Application, repo: &crate::domain::entities::Repository) -> WebResult<IndexDetailView> {
    let status = repository_status_summary(&TaskStatusRepository::new(app.db.clone()), &app.dispatcher, repo).await?;
    Ok(IndexDetailView {
        index: to_view(repo),
        status,
    })
}

pub(crate) async fn list(State(app): State<Application>) -> WebResult<impl IntoResponse> {
    let repos = RepositoryRepository::new(app.db.clone()).list().await?;
    Ok(json(IndexesResponse::List(repos.iter().map(to_view).collect())))
}

pub(crate) async fn get(State(app): State<Application>, Path(id): Path<Uuid>) -> WebResult<impl IntoResponse> {
    let repo = RepositoryRepository::new(app.db.clone())
        .get(RepositoryId(id))
        .await?
        .ok_or_else(|| crate::error::KoditError::UnreachableRepo(id.to_string()))?;
    let detail = to_detail_view(&app, &repo).await?;
    Ok(json(IndexesResponse::Item(detail)))
}

/// Registers (or re-registers) a repository and enqueues the top-level
/// `repository.index` task that drives the indexing application (spec
/// §4.8); the route returns immediately, indexing proceeds asynchronously.
pub(crate) async fn create(
    State(app): State<Application>,
    Json(request): Json<CreateIndexRequest>,
) -> WebResult<impl IntoResponse> {
    let sanitized = crate::git::sanitize_uri(&request.uri);
    let repositories = RepositoryRepository::new(app.db.clone());

    let existing = repositories.find_by_uri(&sanitized).await?;

    // Only a genuinely new repository needs its clone target probed; an
    // already-registered one was reachable when it was first created, and
    // re-indexing shouldn't fail just because the remote is briefly down.
    if existing.is_none() {
        let adapter = GixGitAdapter::new();
        if !adapter.is_valid_clone_target(&request.uri).await {
            return Err(crate::error::KoditError::UnreachableRepo(request.uri.clone()).into());
        }
    }

    let repo = match existing {
        Some(existing) => existing,
        None => crate::domain::entities::Repository {
            id: RepositoryId::new(),
            uri: sanitized.clone(),
            cloned_path: app.config.clones_dir().join(id_hex(&sanitized)).to_string_lossy().to_string(),
            tracking_ref: crate::domain::entities::TrackingRef::LatestTag,
            tracked_head: None,
            last_scanned_at: None,
            created_at: chrono::Utc::now(),
        },
    };
    repositories.upsert(&repo).await?;

    app.dispatcher
        .enqueue(crate::domain::entities::Task::new(
            TaskType::RepositoryIndex,
            format!("repository.index:{}", repo.id.0),
            10,
            serde_json::json!({ "uri": request.uri }),
        ))
        .await?;

    let detail = to_detail_view(&app, &repo).await?;
    Ok(json(IndexesResponse::Created(detail)))
}

pub(crate) async fn delete(State(app): State<Application>, Path(id): Path<Uuid>) -> WebResult<impl IntoResponse> {
    RepositoryRepository::new(app.db.clone()).delete(RepositoryId(id)).await?;
    Ok(json(IndexesResponse::Deleted))
}

fn id_hex(sanitized_uri: &str) -> String {
    blake3::hash(sanitized_uri.as_bytes()).to_hex().to_string()
}
