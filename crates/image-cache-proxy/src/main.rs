//! Image cache proxy
//!
//! Serves remote images through the tiered memory/disk/network cache so
//! frontends can load them by origin URL.

mod error;
mod server;
mod types;

use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ProxyConfig;
use image_cache::{ImageCache, ImageCacheConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("image_cache_proxy=info".parse()?)
        .add_directive("image_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting image cache proxy...");

    let config = load_config();
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache.cache_dir);
    info!(
        "Memory cache size: {} MB",
        config.cache.memory_capacity_bytes / (1024 * 1024)
    );

    let cache = ImageCache::from_config(&config.cache)?;
    let state: SharedState = Arc::new(ServerState::new(cache));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}

fn load_config() -> ProxyConfig {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3001);

    ProxyConfig {
        port,
        cache: ImageCacheConfig::from_env(),
    }
}
