// GitHub contents API client
// Uploads go through "create or update file contents":
// https://docs.github.com/en/rest/repos/contents#create-or-update-file-contents
//
// The commit's own URLs are recorded but never used for the public link;
// jsDelivr serves the file straight from owner/repo@branch.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::GitHubConfig;
use crate::models::RemoteFileRecord;
use crate::storage::RemoteStorage;
use crate::types::{AppError, AppResult};

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("piclink/", env!("CARGO_PKG_VERSION"));

pub struct GitHubStorage {
    client: Client,
    config: GitHubConfig,
}

// Request types for the contents API
#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
}

// Response types for the contents API
#[derive(Deserialize)]
struct PutContentsResponse {
    content: Option<ContentInfo>,
    commit: Option<CommitInfo>,
}

#[derive(Deserialize)]
struct ContentInfo {
    path: Option<String>,
    sha: Option<String>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct CommitInfo {
    sha: Option<String>,
}

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

impl GitHubStorage {
    pub fn new(config: GitHubConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    /// Path of `file_name` inside the repository. Shared by the upsert and the CDN URL.
    pub fn remote_path(&self, file_name: &str) -> String {
        if self.config.folder.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.config.folder, file_name)
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn commit_message(file_name: &str) -> String {
        format!("Upload {} picture", file_name)
    }
}

#[async_trait]
impl RemoteStorage for GitHubStorage {
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn push_file(&self, content: &[u8], file_name: &str) -> AppResult<RemoteFileRecord> {
        let path = self.remote_path(file_name);
        let message = Self::commit_message(file_name);

        let request = PutContentsRequest {
            message: message.clone(),
            content: BASE64.encode(content),
            branch: &self.config.branch,
        };

        let response = self
            .client
            .put(self.contents_url(&path))
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("GitHub request error: {}", e);
                AppError::RemoteUpload(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let cause = match serde_json::from_str::<GitHubErrorResponse>(&body) {
                Ok(parsed) => parsed.message,
                Err(_) if body.trim().is_empty() => status.to_string(),
                Err(_) => format!("{}: {}", status, body.trim()),
            };
            error!(status = status.as_u16(), %path, "GitHub upload error: {}", cause);
            return Err(AppError::RemoteUpload(cause));
        }

        // The body only feeds the record; a surprising shape is not an upload failure.
        let parsed: Option<PutContentsResponse> = response.json().await.ok();
        let (content_info, commit_info) = match parsed {
            Some(r) => (r.content, r.commit),
            None => (None, None),
        };

        info!(status = status.as_u16(), %path, "File uploaded to GitHub");

        Ok(RemoteFileRecord {
            owner: self.config.owner.clone(),
            repo: self.config.repo.clone(),
            branch: self.config.branch.clone(),
            path: content_info
                .as_ref()
                .and_then(|c| c.path.clone())
                .unwrap_or(path),
            file_name: file_name.to_string(),
            commit_message: message,
            content_sha: content_info.as_ref().and_then(|c| c.sha.clone()),
            commit_sha: commit_info.and_then(|c| c.sha),
            html_url: content_info.and_then(|c| c.html_url),
        })
    }

    fn derive_url(&self, file_name: &str) -> String {
        format!(
            "https://{}/{}/{}@{}/{}",
            self.config.cdn_host,
            self.config.owner,
            self.config.repo,
            self.config.branch,
            self.remote_path(file_name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(api_base: &str) -> GitHubConfig {
        GitHubConfig {
            token: "ghp_test".to_string(),
            owner: "alice".to_string(),
            repo: "assets".to_string(),
            branch: "main".to_string(),
            folder: "images".to_string(),
            api_base: api_base.to_string(),
            cdn_host: "cdn.jsdelivr.net/gh".to_string(),
        }
    }

    #[test]
    fn test_derive_url() {
        let storage = GitHubStorage::new(test_config("https://api.github.com")).unwrap();
        assert_eq!(
            storage.derive_url("a1b2c3.png"),
            "https://cdn.jsdelivr.net/gh/alice/assets@main/images/a1b2c3.png"
        );
        // Pure: same inputs, same output
        assert_eq!(storage.derive_url("a1b2c3.png"), storage.derive_url("a1b2c3.png"));
    }

    #[test]
    fn test_derive_url_without_folder() {
        let mut config = test_config("https://api.github.com");
        config.folder = String::new();
        config.branch = "gh-pages".to_string();
        let storage = GitHubStorage::new(config).unwrap();

        assert_eq!(storage.remote_path("x.gif"), "x.gif");
        assert_eq!(
            storage.derive_url("x.gif"),
            "https://cdn.jsdelivr.net/gh/alice/assets@gh-pages/x.gif"
        );
    }

    #[tokio::test]
    async fn test_push_file_sends_contents_upsert() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/repos/alice/assets/contents/images/a1b2c3.png")
            .match_header("authorization", "Bearer ghp_test")
            .match_header("accept", GITHUB_ACCEPT)
            .match_header("x-github-api-version", GITHUB_API_VERSION)
            .match_body(Matcher::Json(json!({
                "message": "Upload a1b2c3.png picture",
                "content": BASE64.encode(b"fake png bytes"),
                "branch": "main",
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": {
                        "name": "a1b2c3.png",
                        "path": "images/a1b2c3.png",
                        "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3",
                        "html_url": "https://github.com/alice/assets/blob/main/images/a1b2c3.png"
                    },
                    "commit": { "sha": "7638417db6d59f3c431d3e1f261cc637155684cd" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let storage = GitHubStorage::new(test_config(&server.url())).unwrap();
        let record = storage.push_file(b"fake png bytes", "a1b2c3.png").await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.path, "images/a1b2c3.png");
        assert_eq!(record.file_name, "a1b2c3.png");
        assert_eq!(record.commit_message, "Upload a1b2c3.png picture");
        assert_eq!(
            record.commit_sha.as_deref(),
            Some("7638417db6d59f3c431d3e1f261cc637155684cd")
        );
    }

    #[tokio::test]
    async fn test_push_file_surfaces_github_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/repos/alice/assets/contents/images/a1b2c3.png")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com/rest"}"#)
            .expect(1)
            .create_async()
            .await;

        let storage = GitHubStorage::new(test_config(&server.url())).unwrap();
        let err = storage.push_file(b"bytes", "a1b2c3.png").await.unwrap_err();

        // Single attempt, no retry
        mock.assert_async().await;
        match err {
            AppError::RemoteUpload(cause) => assert_eq!(cause, "Bad credentials"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_push_file_non_json_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", Matcher::Any)
            .with_status(502)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let storage = GitHubStorage::new(test_config(&server.url())).unwrap();
        let err = storage.push_file(b"bytes", "a.png").await.unwrap_err();

        let text = err.to_string();
        assert!(text.starts_with("Failed to upload to GitHub: 502"));
        assert!(text.contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_push_file_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let storage =
            GitHubStorage::new(test_config(&format!("http://127.0.0.1:{}", port))).unwrap();
        let err = storage.push_file(b"bytes", "a.png").await.unwrap_err();
        assert!(matches!(err, AppError::RemoteUpload(_)));
    }

    #[tokio::test]
    async fn test_push_file_tolerates_unexpected_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/repos/alice/assets/contents/images/b.webp")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let storage = GitHubStorage::new(test_config(&server.url())).unwrap();
        let record = storage.push_file(b"bytes", "b.webp").await.unwrap();

        assert_eq!(record.path, "images/b.webp");
        assert!(record.content_sha.is_none());
    }
}
