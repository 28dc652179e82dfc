// Remote storage layer (commit-based file hosting)

use async_trait::async_trait;

use crate::models::RemoteFileRecord;
use crate::types::AppResult;

pub mod github;

pub use github::GitHubStorage;

/// A remote, version-controlled blob store used purely as a durable file host.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Upsert `content` under `file_name` in the configured location.
    async fn push_file(&self, content: &[u8], file_name: &str) -> AppResult<RemoteFileRecord>;

    /// Public CDN URL for `file_name`. Pure; performs no I/O.
    fn derive_url(&self, file_name: &str) -> String;
}
