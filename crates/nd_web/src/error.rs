use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Any failure behind a route. Rendered as `500 {"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(nd_core::Error);

impl From<nd_core::Error> for ApiError {
    fn from(e: nd_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        let body = Json(json!({ "error": self.0.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
