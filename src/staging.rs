//! Transient Local Stage
//!
//! Holds one uploaded image on local disk between "received" and "pushed to
//! the remote repository". Each file lives under a generated, collision-free
//! name; the request that created it is the only one that ever touches it.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{AppError, AppResult};

/// An image written to the staging directory, awaiting its remote push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct LocalStage {
    dir: PathBuf,
}

impl LocalStage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        if !fs::try_exists(&self.dir).await.unwrap_or(false) {
            fs::create_dir_all(&self.dir).await?;
            info!(path = %self.dir.display(), "Created staging directory");
        }
        Ok(())
    }

    /// Write `content` under a freshly generated name.
    pub async fn stage(
        &self,
        content: &[u8],
        original_name: Option<&str>,
        content_type: &str,
    ) -> AppResult<StagedFile> {
        let file_name = generate_file_name(original_name, content_type);
        let path = self.dir.join(&file_name);

        fs::write(&path, content)
            .await
            .map_err(|source| AppError::Staging { path: path.clone(), source })?;

        debug!(path = %path.display(), size = content.len(), "Staged upload");

        Ok(StagedFile {
            path,
            file_name,
            size: content.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    pub async fn read(&self, file: &StagedFile) -> AppResult<Vec<u8>> {
        fs::read(&file.path).await.map_err(|source| AppError::Staging {
            path: file.path.clone(),
            source,
        })
    }

    pub async fn remove(&self, file: &StagedFile) -> AppResult<()> {
        fs::remove_file(&file.path)
            .await
            .map_err(|source| AppError::LocalCleanup {
                path: file.path.clone(),
                source,
            })?;

        debug!(path = %file.path.display(), "Removed staged file");
        Ok(())
    }
}

/// `<uuid>.<ext>`, taking the extension from the client's file name when it
/// has one and from the content type otherwise.
pub fn generate_file_name(original_name: Option<&str>, content_type: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();

    match file_extension(original_name, content_type) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id,
    }
}

fn file_extension(original_name: Option<&str>, content_type: &str) -> Option<String> {
    let from_name = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .and_then(sanitize_extension);

    from_name.or_else(|| match content_type {
        // mime_guess lists "jfif" first for JPEG
        "image/jpeg" | "image/pjpeg" => Some("jpg".to_string()),
        _ => mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first())
            .and_then(|ext| sanitize_extension(ext)),
    })
}

fn sanitize_extension(ext: &str) -> Option<String> {
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
