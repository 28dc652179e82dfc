use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Resolve `host:port` to a bindable address. `HOST` may be an IP or a hostname.
    pub async fn listen_addr(&self) -> Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("Invalid HOST: {}", self.host))?
            .next()
            .with_context(|| format!("HOST {} did not resolve to any address", self.host))
    }
}

/// Coordinates of the repository that hosts uploaded images.
#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub folder: String,
    pub api_base: String,
    pub cdn_host: String,
}

// Hand-written so the token never reaches the logs.
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .field("cdn_host", &self.cdn_host)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub staging_dir: PathBuf,
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        Ok(Self {
            server: ServerConfig {
                port: var("PORT", "3001")
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("FRONTEND_URL", "http://localhost:5173")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            github: GitHubConfig {
                token: required("GITHUB_TOKEN")?,
                owner: required("GITHUB_USERNAME")?,
                repo: required("GITHUB_REPO")?,
                branch: var("GITHUB_BRANCH", "main"),
                folder: var("GITHUB_FOLDER", "images").trim_matches('/').to_string(),
                api_base: var("GITHUB_API_URL", "https://api.github.com")
                    .trim_end_matches('/')
                    .to_string(),
                cdn_host: var("CDN_HOST", "cdn.jsdelivr.net/gh")
                    .trim_matches('/')
                    .to_string(),
            },
            upload: UploadConfig {
                staging_dir: PathBuf::from(var("UPLOAD_DIR", "uploads")),
                max_file_size: match lookup("MAX_UPLOAD_SIZE") {
                    Some(value) => value
                        .parse()
                        .context("MAX_UPLOAD_SIZE must be a size in bytes")?,
                    None => DEFAULT_MAX_UPLOAD_SIZE,
                },
            },
            logging: LoggingConfig {
                dir: lookup("LOG_DIR").filter(|s| !s.is_empty()).map(PathBuf::from),
            },
        })
    }
}
