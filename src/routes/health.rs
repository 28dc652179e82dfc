use axum::{routing::get, Json, Router};

use crate::models::{HealthResponse, StatusResponse};

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
        message: "PicLink Server is running".to_string(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
