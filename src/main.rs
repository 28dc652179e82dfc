use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use piclink::{
    config::Config, routes::create_router, staging::LocalStage, storage::GitHubStorage,
    utils::init_logger, AppState,
};

#[derive(Parser, Debug)]
#[command(name = "piclink", version, about = "Relay image uploads to GitHub and return CDN links")]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Staging directory for incoming files (overrides UPLOAD_DIR)
    #[arg(long)]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.upload_dir {
        config.upload.staging_dir = dir;
    }

    // Initialize tracing
    let _log_guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.server);
    info!(
        owner = %config.github.owner,
        repo = %config.github.repo,
        branch = %config.github.branch,
        folder = %config.github.folder,
        "Uploads go to GitHub"
    );

    // Ensure the staging directory exists
    LocalStage::new(config.upload.staging_dir.clone())
        .ensure_dir()
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload.staging_dir.display()
            )
        })?;

    let storage = GitHubStorage::new(config.github.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build GitHub client: {}", e))?;

    // Create shared state
    let state = AppState::new(config.clone(), Arc::new(storage));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = config.server.listen_addr().await?;

    let listener = TcpListener::bind(addr).await?;
    info!("PicLink Server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
