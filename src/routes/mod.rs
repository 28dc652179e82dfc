//! API Routes
//!
//! - `POST /upload` - Image upload, relayed to the GitHub repository
//! - `GET /` - Liveness message
//! - `GET /api/health` - Health check
//!
//! Anything else gets a JSON 404, or a JSON 405 for a known path.

pub mod health;
pub mod upload;

use axum::Router;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use crate::middleware::{cors_layer, handle_panic, method_not_allowed, not_found};
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server);

    Router::new()
        .merge(health::router())
        .merge(upload::router(state))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
}
