// Error taxonomy for the upload relay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use tracing::{error, warn};

use crate::models::{ClientErrorBody, ServerErrorBody};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please upload an image")]
    MissingFile,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Image exceeds the maximum upload size of {0} bytes")]
    PayloadTooLarge(u64),

    #[error("Failed to upload to GitHub: {0}")]
    RemoteUpload(String),

    #[error("Failed to stage {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove staged file {}: {source}", .path.display())]
    LocalCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RemoteUpload(_) | AppError::Staging { .. } | AppError::LocalCleanup { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-correctable errors carry a `message`; server failures carry an `error`.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_client_error() {
            warn!(error = %self, status = status.as_u16(), "Upload rejected");
            let body = ClientErrorBody {
                message: self.to_string(),
            };
            return (status, Json(body)).into_response();
        }

        error!(error = %self, status = status.as_u16(), "Upload failed");
        let body = ServerErrorBody {
            error: format!("Failed to process upload: {}", self),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_response() {
        let response = AppError::MissingFile.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Please upload an image" })
        );
    }

    #[tokio::test]
    async fn test_remote_upload_response_wraps_cause() {
        let response = AppError::RemoteUpload("Bad credentials".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "error": "Failed to process upload: Failed to upload to GitHub: Bad credentials"
            })
        );
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_server_error() {
        let err = AppError::LocalCleanup {
            path: PathBuf::from("uploads/a1b2c3.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_client_error());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let text = body["error"].as_str().unwrap();
        assert!(text.starts_with("Failed to process upload: Failed to remove staged file"));
        assert!(text.contains("a1b2c3.png"));
    }

    #[test]
    fn test_payload_too_large_status() {
        assert_eq!(
            AppError::PayloadTooLarge(1024).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
