use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::ProductionLine;
use crate::models::{Production, ProductionRecord, ProductionTrendPoint};

#[derive(Debug, Default, Deserialize)]
pub struct ProductionQuery {
    pub office: Option<String>,
    pub agency_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    pub office: Option<String>,
    #[serde(default)]
    pub line: ProductionLine,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub rows_written: usize,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `GET /production?office=&agency_code=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ProductionQuery>,
) -> Result<Json<Vec<Production>>, ApiError> {
    let conn = ctx.db()?;
    let rows = db::list_production(&conn, non_blank(&query.office), non_blank(&query.agency_code))?;
    Ok(Json(rows))
}

/// `POST /production`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<ProductionRecord>,
) -> Result<(StatusCode, Json<Production>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    let row = db::insert_production(&conn, &payload)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `POST /production/bulk`. Upserts by (agency_code, month) in one
/// transaction.
pub async fn bulk(
    State(ctx): State<ApiContext>,
    Json(payload): Json<Vec<ProductionRecord>>,
) -> Result<(StatusCode, Json<BulkResponse>), ApiError> {
    for record in &payload {
        record.validate()?;
    }
    let conn = ctx.db()?;
    let rows_written = db::bulk_upsert_production(&conn, &payload)?;
    tracing::info!(rows_written, "Bulk production upsert");
    Ok((StatusCode::ACCEPTED, Json(BulkResponse { rows_written })))
}

/// `GET /production/trend?office=&line=all|standard|surplus`
pub async fn trend(
    State(ctx): State<ApiContext>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<ProductionTrendPoint>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::production_trend(&conn, non_blank(&query.office), query.line)?))
}
