use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AgencyFilter, ApiContext};
use crate::db;
use crate::models::{MarketingLog, MarketingLogUpdate, NewMarketingLog};

/// `GET /logs?agency_id=`, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<AgencyFilter>,
) -> Result<Json<Vec<MarketingLog>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::list_logs(&conn, filter.agency_id)?))
}

/// `POST /logs`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewMarketingLog>,
) -> Result<(StatusCode, Json<MarketingLog>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    let log = db::insert_log(&conn, &payload)?;
    Ok((StatusCode::CREATED, Json(log)))
}

/// `PATCH /logs/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<MarketingLogUpdate>,
) -> Result<Json<MarketingLog>, ApiError> {
    let conn = ctx.db()?;
    db::update_log(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Log"))
}

/// `DELETE /logs/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.db()?;
    if db::delete_log(&conn, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Log"))
    }
}
