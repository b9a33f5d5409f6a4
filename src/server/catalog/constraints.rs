use axum::{Json, response::IntoResponse};

use crate::resolve;
use crate::server::dto::{CheckConstraintRequest, CheckConstraintResponse};
use crate::server::response::{ApiError, ApiResponse};

/// Evaluates a version against a range. A range that does not parse is the
/// caller's mistake and answered with 400.
pub async fn check_constraint(Json(req): Json<CheckConstraintRequest>) -> impl IntoResponse {
    let satisfies = resolve::check_constraint(&req.version, &req.range)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(CheckConstraintResponse {
        satisfies,
    })))
}
