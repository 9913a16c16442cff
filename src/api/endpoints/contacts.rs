use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AgencyFilter, ApiContext};
use crate::db;
use crate::models::{Contact, ContactUpdate, NewContact};

/// `GET /contacts?agency_id=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<AgencyFilter>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::list_contacts(&conn, filter.agency_id)?))
}

/// `POST /contacts`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    let contact = db::insert_contact(&conn, &payload)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// `PATCH /contacts/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<ContactUpdate>,
) -> Result<Json<Contact>, ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    db::update_contact(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Contact"))
}

/// `DELETE /contacts/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.db()?;
    if db::delete_contact(&conn, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Contact"))
    }
}
