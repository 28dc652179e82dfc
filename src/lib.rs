// PicLink - image relay that stores uploads in a GitHub repository
// and hands back jsDelivr CDN links

pub mod config;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod staging;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
