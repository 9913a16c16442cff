use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{self, DatabaseError};
use crate::models::{NewOffice, Office};

/// `GET /offices`, ordered by code.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Office>>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(db::list_offices(&conn)?))
}

/// `POST /offices`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewOffice>,
) -> Result<(StatusCode, Json<Office>), ApiError> {
    payload.validate()?;
    let conn = ctx.db()?;
    match db::insert_office(&conn, &payload) {
        Ok(office) => {
            tracing::info!(code = %office.code, "Office created");
            Ok((StatusCode::CREATED, Json(office)))
        }
        Err(DatabaseError::UniqueViolation(_)) => {
            Err(ApiError::BadRequest("Office code already exists".into()))
        }
        Err(e) => Err(e.into()),
    }
}
