//! Volatile in-memory tier

use crate::key::StorageKey;
use crate::types::ImageData;
use moka::sync::Cache;

/// Bounded key → bytes cache. Capacity is measured in bytes (payload plus
/// key, at least one per entry) and eviction is left to moka. Clones share
/// the same underlying cache.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<StorageKey, ImageData>,
}

impl MemoryStore {
    /// Create a store holding at most `max_bytes` of image data
    pub fn new(max_bytes: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|key: &StorageKey, data: &ImageData| -> u32 {
                data.len()
                    .saturating_add(key.as_str().len())
                    .try_into()
                    .unwrap_or(u32::MAX)
                    .max(1)
            })
            .build();

        Self { cache }
    }

    pub fn get(&self, key: &StorageKey) -> Option<ImageData> {
        self.cache.get(key)
    }

    pub fn put(&self, key: StorageKey, data: ImageData) {
        self.cache.insert(key, data);
    }

    pub fn contains(&self, key: &StorageKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Approximate number of entries
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Total weight of the stored entries in bytes
    pub fn weighted_size(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.weighted_size()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
