//! Cache types

use crate::error::{ImageCacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Raw bytes of a cached resource. Cloning shares the allocation.
pub type ImageData = Arc<[u8]>;

/// Absolute network address of a remote resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator(Url);

impl ResourceLocator {
    /// Parse and validate an absolute http(s) URL
    pub fn parse(input: &str) -> Result<Self> {
        Self::try_from(Url::parse(input)?)
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<Url> for ResourceLocator {
    type Error = ImageCacheError;

    fn try_from(url: Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ImageCacheError::InvalidLocator(format!(
                "Unsupported scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ImageCacheError::InvalidLocator(format!(
                "Missing host: {}",
                url
            )));
        }
        Ok(Self(url))
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Priority levels for loading images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPriority {
    /// Background loading
    Low,
    #[default]
    Standard,
    /// Images that should appear immediately
    High,
}

impl FromStr for LoadPriority {
    type Err = ImageCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(LoadPriority::Low),
            "standard" => Ok(LoadPriority::Standard),
            "high" => Ok(LoadPriority::High),
            other => Err(ImageCacheError::Unknown(format!(
                "Unknown load priority: {}",
                other
            ))),
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub memory_entries: u64,
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub disk_writes: u64,
    pub disk_writes_skipped: u64,
    pub disk_errors: u64,
}
