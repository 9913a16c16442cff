use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AgencyFilter, ApiContext};
use crate::db;
use crate::models::{NewTask, Task, TaskUpdate};

/// `GET /tasks?agency_id=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<AgencyFilter>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::list_tasks(&conn, filter.agency_id)?))
}

/// `POST /tasks`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    let task = db::insert_task(&conn, &payload)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PATCH /tasks/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<Task>, ApiError> {
    let conn = ctx.db()?;
    db::update_task(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task"))
}

/// `DELETE /tasks/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.db()?;
    if db::delete_task(&conn, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Task"))
    }
}
