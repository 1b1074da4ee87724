pub mod external_handler;
pub mod post_handlers;
pub mod site_handlers;
pub mod user_handlers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// A missing record is a normal answer, not a failure for the error pipeline.
pub(crate) fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}

pub(crate) fn deleted(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}
