//! Core types for the image cache proxy

use image_cache::{CacheStats, ImageCacheConfig};
use serde::{Deserialize, Serialize};

/// Configuration for the proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub cache: ImageCacheConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cache: ImageCacheConfig::default(),
        }
    }
}

/// Query parameters for `/image`
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: String,
    pub priority: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
