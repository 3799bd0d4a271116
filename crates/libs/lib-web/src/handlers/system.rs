//! # System Handlers
//!
//! Liveness, configuration echo and a database connectivity check.

use std::sync::Arc;

use axum::extract::{Json, State};
use lib_core::{ModelManager, Settings};
use serde_json::{json, Value};
use tracing::warn;

use crate::middleware::CurrentUser;

/// `GET /health` - never touches the database.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /` - echoes the resolved configuration with the password masked.
pub async fn root(State(settings): State<Arc<Settings>>) -> Json<Value> {
    Json(json!({
        "message": format!("Hello from the {}!", settings.app_name),
        "debug_mode": settings.debug,
        "database_type": settings.db_type.to_string(),
        "database_url_hidden_password": settings.database_url_redacted(),
    }))
}

/// `GET /db-check` - runs `SELECT 1`.
///
/// Always answers `200`; failures are reported in the body.
pub async fn db_check(State(mm): State<ModelManager>) -> Json<Value> {
    let ping = match mm.acquire_session().await {
        Ok(mut session) => session.ping().await,
        Err(e) => Err(e),
    };

    match ping {
        Ok(1) => Json(json!({ "status": "ok", "message": "Database connection succeeded" })),
        Ok(other) => Json(json!({
            "status": "error",
            "message": format!("Database connection failed: unexpected ping result {other}"),
        })),
        Err(e) => {
            warn!("[DB CHECK] {}", e);
            Json(json!({
                "status": "error",
                "message": format!("Database connection failed: {e}"),
            }))
        }
    }
}

/// `GET /authenticated-route` - greets the current active user.
pub async fn authenticated_route(CurrentUser { user, .. }: CurrentUser) -> Json<Value> {
    Json(json!({ "message": format!("Hello {}!", user.email) }))
}
