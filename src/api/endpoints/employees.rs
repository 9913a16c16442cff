use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, OfficeFilter};
use crate::db;
use crate::models::{Employee, EmployeeUpdate, NewEmployee};

/// `GET /employees?office=CODE`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<OfficeFilter>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::list_employees(&conn, filter.code())?))
}

/// `POST /employees`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    let employee = db::insert_employee(&conn, &payload)?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// `PATCH /employees/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeUpdate>,
) -> Result<Json<Employee>, ApiError> {
    let conn = ctx.db()?;
    db::update_employee(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Employee"))
}
