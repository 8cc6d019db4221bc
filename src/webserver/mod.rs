//! HTTP + MCP surface (spec §6), grounded on the teacher's `bin/webserver.rs`
//! router-assembly idiom (`Router::new().nest(...).layer(...)`) generalised
//! from the teacher's `/api` tree to kodit's `/api/v1` tree plus the MCP
//! tool endpoint and the public docs/health routes.

mod auth;
mod health;
mod indexes;
mod mcp;
mod search;
mod types;

use std::net::SocketAddr;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::application::Application;
use crate::error::KoditResult;

fn api_v1_router(app: Application) -> Router<Application> {
    Router::new()
        .route("/indexes", get(indexes::list).post(indexes::create))
        .route("/indexes/:id", get(indexes::get).delete(indexes::delete))
        .route("/search", post(search::search))
        .route_layer(axum::middleware::from_fn_with_state(app, auth::require_token))
}

fn router(app: Application) -> Router {
    let api = api_v1_router(app.clone());

    Router::new()
        .route("/", get(|| async { "kodit" }))
        .route("/healthz", get(health::health))
        .route("/docs", get(|| async { "see /openapi.json" }))
        .route("/openapi.json", get(openapi))
        .route("/mcp/retrieve_relevant_snippets", post(mcp::retrieve_relevant_snippets))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .with_state(app)
}

async fn openapi() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "openapi": "3.0.0",
        "info": { "title": "kodit", "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/api/v1/indexes": {},
            "/api/v1/search": {},
        },
    }))
}

/// Binds and serves the HTTP API until the process is terminated (spec §6).
pub async fn serve(app: Application) -> KoditResult<()> {
    let bind: SocketAddr = format!("{}:{}", app.config.host, app.config.port)
        .parse()
        .map_err(|e| crate::error::KoditError::Config(format!("invalid host/port: {e}")))?;

    axum::Server::bind(&bind)
        .serve(router(app).into_make_service())
        .await
        .map_err(|e| crate::error::KoditError::Fatal(format!("webserver exited: {e}")))
}
