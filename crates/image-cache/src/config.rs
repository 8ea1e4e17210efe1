//! Environment-driven cache configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const CACHE_SUBDIRECTORY: &str = "image-cache";
const DEFAULT_MEMORY_BYTES: u64 = 64 * 1024 * 1024; // 64 MiB
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Image cache configuration
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    pub cache_dir: PathBuf,
    pub memory_capacity_bytes: u64,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl ImageCacheConfig {
    /// Parse configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_dir = env::var("IMAGE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let memory_capacity_bytes = env::var("IMAGE_CACHE_MEMORY_BYTES")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.memory_capacity_bytes);

        let request_timeout = env::var("IMAGE_CACHE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let user_agent = env::var("IMAGE_CACHE_USER_AGENT").unwrap_or(defaults.user_agent);

        Self {
            cache_dir,
            memory_capacity_bytes,
            request_timeout,
            user_agent,
        }
    }
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            memory_capacity_bytes: DEFAULT_MEMORY_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("image-cache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Per-user platform cache directory plus a fixed subdirectory
pub fn default_cache_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.cache_dir().join(CACHE_SUBDIRECTORY))
        .unwrap_or_else(|| PathBuf::from("./cache").join(CACHE_SUBDIRECTORY))
}
