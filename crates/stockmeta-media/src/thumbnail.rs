//! Thumbnail disk cache and the bounded decode queue.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;

use stockmeta_types::{MediaFile, MetadataError};

use crate::normalize::MediaNormalizer;

/// List thumbnail box.
pub const THUMB_SIZE: (u32, u32) = (244, 152);
/// Preview thumbnail box.
pub const PREVIEW_SIZE: (u32, u32) = (262, 164);

/// PNG thumbnails cached on disk, keyed by path and box size.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache location for a file at a given box size.
    pub fn cache_path(&self, file: &Path, width: u32, height: u32) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}{width}{height}", file.display()).as_bytes());
        let key = hex::encode(hasher.finalize());
        self.dir.join(format!("{key}.png"))
    }

    /// Return the cached thumbnail, rendering it first when absent.
    pub async fn get_or_create(
        &self,
        normalizer: &MediaNormalizer,
        file: &MediaFile,
        width: u32,
        height: u32,
    ) -> Result<PathBuf, MetadataError> {
        let path = self.cache_path(&file.path, width, height);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
        let png = normalizer.thumbnail(file, width, height).await?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, png).await?;
        tracing::debug!(file = %file.name, cache = %path.display(), "Thumbnail cached");
        Ok(path)
    }
}

/// FIFO queue bounding how many decode jobs run at once.
///
/// Jobs wait for a permit in submission order; the semaphore is fair, so a
/// freed slot goes to the oldest waiter.
#[derive(Debug, Clone)]
pub struct ThumbnailQueue {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ThumbnailQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Wait for a slot, then run `job`.
    pub async fn run<F, T>(&self, job: F) -> Result<T, MetadataError>
    where
        F: Future<Output = Result<T, MetadataError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MetadataError::Validation("thumbnail queue closed".into()))?;
        job.await
    }
}

/// Render thumbnails for `files` through `queue`, in submission order.
///
/// Failures are reported per file and do not stop the others.
pub async fn generate_thumbnails(
    files: &[MediaFile],
    cache: &ThumbnailCache,
    normalizer: &MediaNormalizer,
    queue: &ThumbnailQueue,
    size: (u32, u32),
) -> Vec<Result<PathBuf, MetadataError>> {
    let jobs = files
        .iter()
        .map(|file| queue.run(cache.get_or_create(normalizer, file, size.0, size.1)));
    let results = futures::future::join_all(jobs).await;
    for (file, result) in files.iter().zip(&results) {
        if let Err(e) = result {
            tracing::warn!(file = %file.name, "Thumbnail failed: {e}");
        }
    }
    results
}
