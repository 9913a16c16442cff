//! Reinsurance layering calculator.

use axum::Json;

use crate::api::error::ApiError;
use crate::reinsurance::{self, ReinsuranceInput, ReinsuranceResult};

/// `POST /reinsurance/calculate`
pub async fn calculate(
    Json(input): Json<ReinsuranceInput>,
) -> Result<Json<ReinsuranceResult>, ApiError> {
    Ok(Json(reinsurance::calculate(&input)?))
}
