mod error;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use inspectra::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,inspectra=debug")),
        )
        .init();

    let config = load_config()?;
    let bind_addr = config.server.bind_addr.clone();

    let state = state::AppState::from_config(&config)?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "Inspectra server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let path = std::env::var("INSPECTRA_CONFIG").unwrap_or_else(|_| "inspectra.json".to_string());
    if Path::new(&path).exists() {
        tracing::info!(path = %path, "Loading configuration");
        AppConfig::from_file(Path::new(&path)).map_err(anyhow::Error::msg)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(AppConfig::default())
    }
}
