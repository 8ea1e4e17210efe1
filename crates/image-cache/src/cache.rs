//! Tiered resolution across memory, disk and network

use crate::config::ImageCacheConfig;
use crate::disk::{DiskStore, FsDiskStore};
use crate::error::Result;
use crate::fetcher::{HttpFetcher, RemoteFetcher};
use crate::key::{KeyHasher, Sha256KeyHasher, StorageKey};
use crate::memory::MemoryStore;
use crate::types::{CacheStats, ImageData, LoadPriority, ResourceLocator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Counters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    disk_writes: AtomicU64,
    disk_writes_skipped: AtomicU64,
    disk_errors: AtomicU64,
}

/// Image cache consulting memory, then disk, then the network
pub struct ImageCache {
    hasher: Arc<dyn KeyHasher>,
    memory: MemoryStore,
    disk: Arc<dyn DiskStore>,
    fetcher: Arc<dyn RemoteFetcher>,
    counters: Counters,
}

impl ImageCache {
    pub fn new(
        hasher: Arc<dyn KeyHasher>,
        memory: MemoryStore,
        disk: Arc<dyn DiskStore>,
        fetcher: Arc<dyn RemoteFetcher>,
    ) -> Self {
        Self {
            hasher,
            memory,
            disk,
            fetcher,
            counters: Counters::default(),
        }
    }

    /// Build the production tiers from configuration
    pub fn from_config(config: &ImageCacheConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.request_timeout, &config.user_agent)?;
        info!(
            cache_dir = ?config.cache_dir,
            memory_capacity_bytes = config.memory_capacity_bytes,
            "Image cache configured"
        );

        Ok(Self::new(
            Arc::new(Sha256KeyHasher),
            MemoryStore::new(config.memory_capacity_bytes),
            Arc::new(FsDiskStore::new(config.cache_dir.clone())),
            Arc::new(fetcher),
        ))
    }

    /// Return the bytes for `locator`, fetching them only when neither the
    /// memory nor the disk tier holds them. Only a fetch failure is returned
    /// as an error; storage failures are logged and absorbed.
    pub async fn resolve(
        &self,
        locator: &ResourceLocator,
        priority: LoadPriority,
    ) -> Result<ImageData> {
        let key = self.hasher.derive(locator);

        if let Some(data) = self.memory.get(&key) {
            self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Memory cache hit");
            return Ok(data);
        }

        match self.disk.read(&key).await {
            Ok(Some(data)) => {
                self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
                self.memory.put(key, data.clone());
                return Ok(data);
            }
            Ok(None) => {}
            Err(e) => {
                self.counters.disk_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Failed to read disk cache, treating as miss");
            }
        }

        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        let data = match self.fetcher.fetch(locator, priority).await {
            Ok(data) => data,
            Err(e) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                warn!(url = %locator, error = %e, "Failed to fetch image");
                return Err(e);
            }
        };

        self.persist(&key, &data).await;
        self.memory.put(key, data.clone());

        Ok(data)
    }

    /// Write to disk when free space strictly exceeds the payload size.
    /// The check is advisory; other writers may consume the space first.
    async fn persist(&self, key: &StorageKey, data: &[u8]) {
        let size = data.len() as u64;

        match self.disk.available_bytes() {
            Ok(available) if available > size => {}
            Ok(available) => {
                self.counters.disk_writes_skipped.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, size, available, "Insufficient disk space, skipping persistence");
                return;
            }
            Err(e) => {
                self.counters.disk_writes_skipped.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Skipping persistence");
                return;
            }
        }

        match self.disk.write(key, data).await {
            Ok(()) => {
                self.counters.disk_writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.disk_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Failed to write disk cache");
            }
        }
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            memory_entries: self.memory.entry_count(),
            memory_hits: c.memory_hits.load(Ordering::Relaxed),
            disk_hits: c.disk_hits.load(Ordering::Relaxed),
            fetches: c.fetches.load(Ordering::Relaxed),
            fetch_failures: c.fetch_failures.load(Ordering::Relaxed),
            disk_writes: c.disk_writes.load(Ordering::Relaxed),
            disk_writes_skipped: c.disk_writes_skipped.load(Ordering::Relaxed),
            disk_errors: c.disk_errors.load(Ordering::Relaxed),
        }
    }
}
