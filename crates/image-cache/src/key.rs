//! Storage key derivation

use crate::types::ResourceLocator;
use sha2::{Digest, Sha256};
use std::fmt;

/// Filesystem-safe identifier for a cached resource: `scheme://host/<digest>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    key: String,
    digest_start: usize,
}

impl StorageKey {
    fn new(namespace: &str, digest: &str) -> Self {
        let key = format!("{}/{}", namespace, digest);
        Self {
            digest_start: key.len() - digest.len(),
            key,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Last path segment of the key, used as the on-disk file name
    pub fn digest(&self) -> &str {
        &self.key[self.digest_start..]
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Derives storage keys from resource locators
pub trait KeyHasher: Send + Sync {
    fn derive(&self, locator: &ResourceLocator) -> StorageKey;
}

/// Hashes `path?query` with SHA-256 under a `scheme://host` namespace.
/// The fragment never contributes to the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyHasher;

impl KeyHasher for Sha256KeyHasher {
    fn derive(&self, locator: &ResourceLocator) -> StorageKey {
        let url = locator.url();

        let mut hasher = Sha256::new();
        hasher.update(url.path().as_bytes());
        if let Some(query) = url.query() {
            hasher.update(b"?");
            hasher.update(query.as_bytes());
        }
        let digest = hex::encode(hasher.finalize());

        let host = url.host_str().unwrap_or_default();
        let namespace = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        StorageKey::new(&namespace, &digest)
    }
}
