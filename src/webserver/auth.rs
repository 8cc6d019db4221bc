//! Bearer token auth (spec §6): constant-time comparison via `subtle`
//! against the configured token set. Layered only on the `/api/v1` router
//! via `route_layer`, so the public routes (`/`, `/healthz`, `/docs`,
//! `/openapi.json`, the MCP endpoint) never pass through this middleware
//! at all.

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::application::Application;

pub(crate) async fn require_token<B>(
    State(app): State<Application>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, StatusCode> {
    if app.config.api_tokens.is_empty() {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(presented) = presented else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let matches = app
        .config
        .api_tokens
        .iter()
        .any(|token| token.as_bytes().ct_eq(presented.as_bytes()).into());

    if matches {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
