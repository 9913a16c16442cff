use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Detail, OfficeFilter};
use crate::db;
use crate::models::{Agency, AgencyInput, AgencyUpdate};

/// `GET /agencies?office=CODE`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<OfficeFilter>,
) -> Result<Json<Vec<Agency>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::list_agencies(&conn, filter.code())?))
}

/// `GET /agencies/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Agency>, ApiError> {
    let conn = ctx.db()?;
    db::get_agency(&conn, id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Agency"))
}

/// `POST /agencies`. A duplicate code is a 409.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<AgencyInput>,
) -> Result<(StatusCode, Json<Agency>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    let agency = db::insert_agency(&conn, &payload)?;
    tracing::info!(id = agency.id, code = %agency.code, "Agency created");
    Ok((StatusCode::CREATED, Json(agency)))
}

/// `PUT /agencies/:id`
pub async fn replace(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<AgencyInput>,
) -> Result<Json<Agency>, ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    db::replace_agency(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Agency"))
}

/// `PATCH /agencies/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<AgencyUpdate>,
) -> Result<Json<Agency>, ApiError> {
    let conn = ctx.db()?;
    db::update_agency(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Agency"))
}

/// `DELETE /agencies/:id`. Contacts cascade; logs, tasks and submissions
/// are unlinked by their foreign keys.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Detail>, ApiError> {
    let conn = ctx.db()?;
    if !db::delete_agency(&conn, id)? {
        return Err(ApiError::not_found("Agency"));
    }
    tracing::info!(id, "Agency deleted");
    Ok(Json(Detail {
        detail: "Agency deleted",
    }))
}
