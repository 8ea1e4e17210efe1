//! Persistent on-disk tier

use crate::error::{ImageCacheError, Result};
use crate::key::StorageKey;
use crate::types::ImageData;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Persistent byte storage addressed by storage key
#[async_trait]
pub trait DiskStore: Send + Sync {
    /// Read the bytes stored under `key`. A missing entry is `Ok(None)`.
    async fn read(&self, key: &StorageKey) -> Result<Option<ImageData>>;

    /// Store `data` under `key`, replacing any previous entry
    async fn write(&self, key: &StorageKey, data: &[u8]) -> Result<()>;

    /// Free bytes on the volume backing the store
    fn available_bytes(&self) -> Result<u64>;
}

/// Flat directory of files named by key digest
pub struct FsDiskStore {
    /// Directory where cached images are stored
    cache_dir: PathBuf,
    /// Set once the cache directory is known to exist
    dir_ready: OnceCell<()>,
    /// Suffix counter for temporary write files
    tmp_counter: AtomicU64,
}

impl FsDiskStore {
    /// Create a store rooted at `cache_dir`. The directory is created on first write.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            dir_ready: OnceCell::new(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    fn entry_path(&self, key: &StorageKey) -> PathBuf {
        self.cache_dir.join(key.digest())
    }

    async fn ensure_dir(&self) -> Result<()> {
        self.dir_ready
            .get_or_try_init(|| async {
                fs::create_dir_all(&self.cache_dir).await?;
                info!(cache_dir = ?self.cache_dir, "Disk cache directory ready");
                Ok::<(), ImageCacheError>(())
            })
            .await?;
        Ok(())
    }

    /// Nearest existing ancestor of the cache directory, so free space can be
    /// queried before the directory itself has been created.
    fn existing_volume_path(&self) -> &Path {
        self.cache_dir
            .ancestors()
            .find(|p| p.exists())
            .unwrap_or(&self.cache_dir)
    }
}

#[async_trait]
impl DiskStore for FsDiskStore {
    async fn read(&self, key: &StorageKey) -> Result<Option<ImageData>> {
        let path = self.entry_path(key);

        if !fs::try_exists(&path).await? {
            debug!(key = %key, "Disk cache miss");
            return Ok(None);
        }

        match fs::read(&path).await {
            Ok(data) => {
                debug!(key = %key, size = data.len(), "Disk cache hit");
                Ok(Some(ImageData::from(data)))
            }
            // Pruned between the existence check and the read
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &StorageKey, data: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let path = self.entry_path(key);
        let tmp_path = self.cache_dir.join(format!(
            ".{}.{}.{}.tmp",
            key.digest(),
            std::process::id(),
            self.tmp_counter.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = fs::write(&tmp_path, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(key = %key, size = data.len(), "Wrote image to disk cache");
        Ok(())
    }

    fn available_bytes(&self) -> Result<u64> {
        fs2::available_space(self.existing_volume_path())
            .map_err(|e| ImageCacheError::SpaceQuery(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyHasher, Sha256KeyHasher};
    use crate::types::ResourceLocator;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn key(url: &str) -> StorageKey {
        Sha256KeyHasher.derive(&ResourceLocator::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let store = FsDiskStore::new(dir.path().to_path_buf());
        let key = key("https://example.com/a.png?v=2");

        store.write(&key, b"Hello, world!").await.unwrap();

        let data = store.read(&key).await.unwrap().unwrap();
        assert_eq!(&data[..], b"Hello, world!");

        // Files are named by digest, flat in the cache directory
        assert!(dir.path().join(key.digest()).is_file());
    }

    #[tokio::test]
    async fn test_read_miss() {
        let dir = tempdir().unwrap();
        let store = FsDiskStore::new(dir.path().to_path_buf());

        let result = store.read(&key("https://example.com/none.png")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_before_directory_exists() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("not").join("yet");
        let store = FsDiskStore::new(cache_dir.clone());

        let result = store.read(&key("https://example.com/a.png")).await;
        assert!(result.unwrap().is_none());
        assert!(!cache_dir.exists());
    }

    #[tokio::test]
    async fn test_write_creates_directory_lazily() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("image-cache");
        let store = FsDiskStore::new(cache_dir.clone());
        assert!(!cache_dir.exists());

        store
            .write(&key("https://example.com/a.png"), b"data")
            .await
            .unwrap();
        assert!(cache_dir.is_dir());
    }

    #[tokio::test]
    async fn test_read_tolerates_external_pruning() {
        let dir = tempdir().unwrap();
        let store = FsDiskStore::new(dir.path().to_path_buf());
        let key = key("https://example.com/a.png");

        store.write(&key, b"data").await.unwrap();
        std::fs::remove_file(dir.path().join(key.digest())).unwrap();

        assert!(store.read(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let dir = tempdir().unwrap();
        let store = FsDiskStore::new(dir.path().to_path_buf());
        let key = key("https://example.com/a.png");

        store.write(&key, b"first").await.unwrap();
        store.write(&key, b"second").await.unwrap();

        let data = store.read(&key).await.unwrap().unwrap();
        assert_eq!(&data[..], b"second");

        // No temporary files are left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes_same_key() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FsDiskStore::new(dir.path().join("cache")));
        let key = key("https://example.com/a.png");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                tokio::spawn(async move { store.write(&key, b"same bytes").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = store.read(&key).await.unwrap().unwrap();
        assert_eq!(&data[..], b"same bytes");
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_file_error() {
        let dir = tempdir().unwrap();
        // A regular file where the cache directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = FsDiskStore::new(blocker);

        let result = store
            .write(&key("https://example.com/a.png"), b"data")
            .await;
        assert!(matches!(result, Err(ImageCacheError::File(_))));
    }

    #[test]
    fn test_available_bytes_before_directory_exists() {
        let dir = tempdir().unwrap();
        let store = FsDiskStore::new(dir.path().join("a").join("b"));

        let available = store.available_bytes().unwrap();
        assert!(available > 0);
    }
}
