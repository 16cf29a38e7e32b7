//! mshelf-me - Metadata Enrichment Microservice
//!
//! Enriches locally-synced manga rows with MangaDex catalog metadata.
//! Invoked over HTTP by the admin panel and the scheduled batch trigger.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mshelf_common::config;
use mshelf_me::services::MangaDexClient;
use mshelf_me::AppState;

const DEFAULT_PORT: u16 = 5731;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mshelf-me (Metadata Enrichment) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration: ENV → TOML → defaults
    let toml_config = config::TomlConfig::load();

    // Missing client identity is fatal; MangaDex rejects anonymous clients
    let user_agent = config::resolve_mangadex_user_agent(&toml_config)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let db_path = config::resolve_database_path(&toml_config);
    info!("Database: {}", db_path.display());

    let db_pool = mshelf_me::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let catalog = MangaDexClient::new(user_agent)
        .map_err(|e| anyhow::anyhow!("Failed to create MangaDex client: {}", e))?;

    let state = AppState::new(db_pool, catalog);
    let app = mshelf_me::build_router(state);

    let port = config::resolve_port(&toml_config, DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
