//! Upload Pipeline
//!
//! Drives one staged image through the relay:
//!
//! ```text
//! validate -> read staged bytes -> push -> derive URL -> cleanup -> respond
//! ```
//!
//! Each stage returns an [`AppResult`] and the first failure short-circuits the
//! rest. The staged file is removed only after the remote push succeeded; when
//! the push fails the file stays on disk so the image is not lost.

use tracing::{info, instrument, warn};

use crate::models::{RemoteFileRecord, UploadResult, UploadedFileInfo, UPLOAD_SUCCESS_MESSAGE};
use crate::staging::{LocalStage, StagedFile};
use crate::storage::RemoteStorage;
use crate::types::{AppError, AppResult};

pub struct UploadPipeline<'a> {
    storage: &'a dyn RemoteStorage,
    stage: &'a LocalStage,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(storage: &'a dyn RemoteStorage, stage: &'a LocalStage) -> Self {
        Self { storage, stage }
    }

    #[instrument(skip_all, fields(file_name = file.as_ref().map(|f| f.file_name.as_str())))]
    pub async fn run(&self, file: Option<StagedFile>) -> AppResult<UploadResult> {
        let file = validate(file)?;
        let content = self.stage.read(&file).await?;
        let record = self.push(&content, &file).await?;
        let cdn_url = self.storage.derive_url(&file.file_name);
        self.stage.remove(&file).await?;

        info!(
            remote_path = %record.path,
            commit = ?record.commit_sha,
            cdn_url = %cdn_url,
            size = file.size,
            "Upload complete"
        );
        Ok(respond(file, cdn_url))
    }

    async fn push(&self, content: &[u8], file: &StagedFile) -> AppResult<RemoteFileRecord> {
        match self.storage.push_file(content, &file.file_name).await {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!(
                    path = %file.path.display(),
                    "Remote push failed, staged file kept for recovery"
                );
                Err(e)
            }
        }
    }
}

fn validate(file: Option<StagedFile>) -> AppResult<StagedFile> {
    file.ok_or(AppError::MissingFile)
}

fn respond(file: StagedFile, cdn_url: String) -> UploadResult {
    UploadResult {
        success: true,
        file: UploadedFileInfo {
            name: file.file_name,
            size: file.size,
        },
        cdn_url,
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
    }
}
