//! Service root, health and version.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config;
use crate::db;

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db: &'static str,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// `GET /`
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        message: "Underwriter Workbench API",
    })
}

/// `GET /health`. Always 200; a failed probe reports `degraded`.
pub async fn health(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let reachable = ctx
        .core
        .open_db()
        .map_err(|e| e.to_string())
        .and_then(|conn| db::ping(&conn).map_err(|e| e.to_string()));

    match reachable {
        Ok(()) => Json(HealthResponse {
            status: "ok",
            db: "reachable",
        }),
        Err(reason) => {
            tracing::warn!(%reason, "Health check could not reach database");
            Json(HealthResponse {
                status: "degraded",
                db: "unreachable",
            })
        }
    }
}

/// `GET /version`
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: config::APP_NAME,
        version: config::APP_VERSION,
    })
}
