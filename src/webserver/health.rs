//! Liveness probe (spec §6: `/healthz` is always public).

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::application::Application;

pub(crate) async fn health(State(app): State<Application>) -> Json<Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&app.db).await.is_ok();
    Json(json!({ "status": if db_ok { "ok" } else { "degraded" } }))
}
