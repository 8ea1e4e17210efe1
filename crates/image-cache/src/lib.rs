//! Tiered image cache
//!
//! Resolves remote images through three tiers consulted in order of cost:
//! a bounded in-memory cache, a flat on-disk cache directory, and the network
//! origin. Disk writes are gated on free space, and only a failed network
//! fetch is ever reported to the caller.

mod cache;
mod config;
mod disk;
mod error;
mod fetcher;
mod key;
mod memory;
mod types;

pub use cache::ImageCache;
pub use config::{default_cache_dir, ImageCacheConfig};
pub use disk::{DiskStore, FsDiskStore};
pub use error::{ImageCacheError, Result};
pub use fetcher::{HttpFetcher, RemoteFetcher};
pub use key::{KeyHasher, Sha256KeyHasher, StorageKey};
pub use memory::MemoryStore;
pub use types::{CacheStats, ImageData, LoadPriority, ResourceLocator};
