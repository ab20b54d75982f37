//! Server binary.
//!
//! Configuration comes from the environment:
//! - `SKIRMISH_ADDR`: listen address (default `127.0.0.1:7777`)
//! - `SKIRMISH_CONTENT`: path to a JSON content file (default: built-in)
//! - `SKIRMISH_MAX_GAMES`: concurrent game limit (default 64)
//! - `RUST_LOG`: log filter, e.g. `skirmish=debug`

use std::sync::Arc;

use skirmish::{Server, ServerConfig, ServerError};
use skirmish_engine::ContentCatalog;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Ok(addr) = std::env::var("SKIRMISH_ADDR") {
        config.bind_addr = addr;
    }
    if let Some(max_games) = std::env::var("SKIRMISH_MAX_GAMES")
        .ok()
        .and_then(|raw| raw.parse().ok())
    {
        config.max_games = max_games;
    }

    let catalog = match std::env::var("SKIRMISH_CONTENT") {
        Ok(path) => {
            tracing::info!(%path, "loading content file");
            let json = std::fs::read_to_string(&path)?;
            ContentCatalog::from_json(&json)?
        }
        Err(_) => ContentCatalog::standard(),
    };

    let server = Server::bind(config, Arc::new(catalog)).await?;
    server.run().await
}
