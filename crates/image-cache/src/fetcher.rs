//! Network retrieval of image bytes

use crate::error::{ImageCacheError, Result};
use crate::types::{ImageData, LoadPriority, ResourceLocator};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const PRIORITY_HEADER: &str = "priority";

/// Fetches the full body of a remote resource
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, locator: &ResourceLocator, priority: LoadPriority) -> Result<ImageData>;
}

/// HTTP fetcher backed by a shared reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ImageCacheError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// HTTP extensible priorities (RFC 9218) urgency for a load priority.
/// Only `High` moves the request into the interactive class.
fn priority_hint(priority: LoadPriority) -> &'static str {
    match priority {
        LoadPriority::High => "u=1",
        LoadPriority::Standard => "u=3",
        LoadPriority::Low => "u=5",
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, locator: &ResourceLocator, priority: LoadPriority) -> Result<ImageData> {
        debug!(url = %locator, ?priority, "Fetching image");

        let response = self
            .client
            .get(locator.url().clone())
            .header(PRIORITY_HEADER, priority_hint(priority))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %locator, "Failed to fetch image");
        }
        let response = response.error_for_status()?;

        let data = response.bytes().await?;
        debug!(url = %locator, size = data.len(), "Fetched image");

        Ok(ImageData::from(&data[..]))
    }
}
