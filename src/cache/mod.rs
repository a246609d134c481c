//! Artifact cache for per-mod metadata and preview images.
//!
//! Each committed mod owns up to two blobs: a JSON metadata record and a
//! preview image. The two stores are independent; an id can have one without
//! the other, and repair treats each gap separately.
//!
//! - [`ArtifactCache`] - async seam used by the engine
//! - [`DiskCache`] - one file per blob under a configurable root
//! - [`MemoryCache`] - in-memory double with failure injection for tests

mod disk;
mod error;

pub use disk::DiskCache;
pub use error::CacheError;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::record::ModRecord;

/// Disk or memory store mapping mod ids to metadata and image blobs.
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Returns true if a metadata blob exists for `id`.
    async fn has_metadata(&self, id: &str) -> Result<bool, CacheError>;

    /// Returns true if an image blob exists for `id`.
    async fn has_image(&self, id: &str) -> Result<bool, CacheError>;

    /// Reads and parses the metadata blob for `id`.
    async fn read_metadata(&self, id: &str) -> Result<ModRecord, CacheError>;

    /// Writes (or replaces) the metadata blob for `record.id`.
    async fn write_metadata(&self, record: &ModRecord) -> Result<(), CacheError>;

    /// Writes (or replaces) the image blob for `id`.
    async fn write_image(&self, id: &str, bytes: &[u8]) -> Result<(), CacheError>;

    /// Deletes the metadata blob; returns whether one existed.
    async fn delete_metadata(&self, id: &str) -> Result<bool, CacheError>;

    /// Deletes the image blob; returns whether one existed.
    async fn delete_image(&self, id: &str) -> Result<bool, CacheError>;

    /// Ids with a metadata blob.
    async fn list_metadata_ids(&self) -> Result<BTreeSet<String>, CacheError>;

    /// Ids with an image blob.
    async fn list_image_ids(&self) -> Result<BTreeSet<String>, CacheError>;

    /// Ids with at least one blob.
    async fn list_cached_ids(&self) -> Result<BTreeSet<String>, CacheError> {
        let mut ids = self.list_metadata_ids().await?;
        ids.extend(self.list_image_ids().await?);
        Ok(ids)
    }
}

/// Rejects ids that cannot safely name a blob.
pub(crate) fn validate_id(id: &str) -> Result<(), CacheError> {
    let unsafe_id = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0'])
        || id.chars().any(char::is_control);
    if unsafe_id {
        return Err(CacheError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

#[derive(Debug, Default)]
struct MemoryBlobs {
    metadata: BTreeMap<String, ModRecord>,
    images: BTreeMap<String, Vec<u8>>,
    failing_metadata_writes: HashSet<String>,
    failing_image_writes: HashSet<String>,
}

/// Artifact cache held in memory. Clones share the same blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    blobs: Arc<Mutex<MemoryBlobs>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every metadata write for `id` fail with an IO error.
    pub fn fail_metadata_writes_for(&self, id: impl Into<String>) {
        self.with_blobs(|blobs| {
            blobs.failing_metadata_writes.insert(id.into());
        });
    }

    /// Makes every image write for `id` fail with an IO error.
    pub fn fail_image_writes_for(&self, id: impl Into<String>) {
        self.with_blobs(|blobs| {
            blobs.failing_image_writes.insert(id.into());
        });
    }

    /// Returns the stored image bytes for `id`.
    #[must_use]
    pub fn image(&self, id: &str) -> Option<Vec<u8>> {
        self.with_blobs(|blobs| blobs.images.get(id).cloned())
    }

    fn with_blobs<T>(&self, f: impl FnOnce(&mut MemoryBlobs) -> T) -> T {
        let mut guard = match self.blobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

fn simulated_failure(id: &str) -> CacheError {
    CacheError::io(
        format!("<memory>/{id}"),
        std::io::Error::other("simulated cache write failure"),
    )
}

#[async_trait]
impl ArtifactCache for MemoryCache {
    async fn has_metadata(&self, id: &str) -> Result<bool, CacheError> {
        Ok(self.with_blobs(|blobs| blobs.metadata.contains_key(id)))
    }

    async fn has_image(&self, id: &str) -> Result<bool, CacheError> {
        Ok(self.with_blobs(|blobs| blobs.images.contains_key(id)))
    }

    async fn read_metadata(&self, id: &str) -> Result<ModRecord, CacheError> {
        self.with_blobs(|blobs| blobs.metadata.get(id).cloned())
            .ok_or_else(|| CacheError::NotFound { id: id.to_string() })
    }

    async fn write_metadata(&self, record: &ModRecord) -> Result<(), CacheError> {
        validate_id(&record.id)?;
        self.with_blobs(|blobs| {
            if blobs.failing_metadata_writes.contains(&record.id) {
                return Err(simulated_failure(&record.id));
            }
            blobs.metadata.insert(record.id.clone(), record.clone());
            Ok(())
        })
    }

    async fn write_image(&self, id: &str, bytes: &[u8]) -> Result<(), CacheError> {
        validate_id(id)?;
        self.with_blobs(|blobs| {
            if blobs.failing_image_writes.contains(id) {
                return Err(simulated_failure(id));
            }
            blobs.images.insert(id.to_string(), bytes.to_vec());
            Ok(())
        })
    }

    async fn delete_metadata(&self, id: &str) -> Result<bool, CacheError> {
        Ok(self.with_blobs(|blobs| blobs.metadata.remove(id).is_some()))
    }

    async fn delete_image(&self, id: &str) -> Result<bool, CacheError> {
        Ok(self.with_blobs(|blobs| blobs.images.remove(id).is_some()))
    }

    async fn list_metadata_ids(&self) -> Result<BTreeSet<String>, CacheError> {
        Ok(self.with_blobs(|blobs| blobs.metadata.keys().cloned().collect()))
    }

    async fn list_image_ids(&self) -> Result<BTreeSet<String>, CacheError> {
        Ok(self.with_blobs(|blobs| blobs.images.keys().cloned().collect()))
    }
}
