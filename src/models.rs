use std::sync::Arc;

use crate::config::Config;
use crate::staging::LocalStage;
use crate::storage::RemoteStorage;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Image uploaded successfully and received CDN URL";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn RemoteStorage>,
    pub stage: LocalStage,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn RemoteStorage>) -> Self {
        let stage = LocalStage::new(config.upload.staging_dir.clone());
        Self { config, storage, stage }
    }
}

/// Response body for a successful `POST /upload`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    pub file: UploadedFileInfo,
    pub cdn_url: String,
    pub message: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadedFileInfo {
    pub name: String,
    pub size: u64,
}

/// Committed blob at `<folder>/<file_name>` in the image repository.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemoteFileRecord {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub file_name: String,
    pub commit_message: String,
    pub content_sha: Option<String>,
    pub commit_sha: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ClientErrorBody {
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ServerErrorBody {
    pub error: String,
}

#[derive(Debug, serde::Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
