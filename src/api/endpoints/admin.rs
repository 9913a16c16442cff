use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::middleware::admin::password_matches;
use crate::api::multipart::read_upload;
use crate::api::types::ApiContext;
use crate::db;
use crate::production::{import_production_workbook, ImportSummary};

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub authenticated: bool,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub office: String,
    #[serde(default)]
    pub month: String,
}

/// `POST /admin/auth`
pub async fn auth(
    State(ctx): State<ApiContext>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if !password_matches(&payload.password, ctx.core.admin_password()) {
        return Err(ApiError::Unauthorized("Invalid password".into()));
    }
    Ok(Json(AuthResponse {
        authenticated: true,
        message: "Admin access granted",
    }))
}

/// `DELETE /admin/employees/:id`
pub async fn delete_employee(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.db()?;
    if !db::delete_employee(&conn, id)? {
        return Err(ApiError::not_found("Employee"));
    }
    tracing::info!(id, "Employee deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/agencies/:id`. Removes contacts, logs and tasks too.
pub async fn delete_agency(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.db()?;
    if !db::delete_agency_cascade(&conn, id)? {
        return Err(ApiError::not_found("Agency"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/production/import?office=CODE&month=YYYY-MM`
pub async fn import_production(
    State(ctx): State<ApiContext>,
    Query(query): Query<ImportQuery>,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let upload = read_upload(multipart).await?;
    tracing::info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        office = %query.office,
        month = %query.month,
        "Production import received"
    );

    let core = ctx.core.clone();
    let summary = tokio::task::spawn_blocking(move || -> Result<ImportSummary, ApiError> {
        let conn = core.open_db()?;
        Ok(import_production_workbook(
            &conn,
            &upload.filename,
            &upload.bytes,
            query.office.trim(),
            query.month.trim(),
        )?)
    })
    .await??;

    Ok(Json(summary))
}
