// Process-wide fallbacks: every response body stays JSON, even for
// unknown routes, wrong methods and handler panics.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::models::ServerErrorBody;

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ServerErrorBody {
            error: "Not Found".to_string(),
        }),
    )
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ServerErrorBody {
            error: "Method Not Allowed".to_string(),
        }),
    )
}

/// Used with `CatchPanicLayer`. The panic message is logged, never returned.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "Server error");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ServerErrorBody {
            error: "Internal Server Error".to_string(),
        }),
    )
        .into_response()
}
