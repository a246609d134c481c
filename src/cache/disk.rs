//! Directory-backed artifact cache.
//!
//! Layout (matching the long-standing `WorkshopObjects` folder):
//!
//! ```text
//! <metadata_dir>/<id>.json
//! <image_dir>/<id>.png
//! ```
//!
//! Blobs are written to a `.tmp` sibling and renamed into place, so a reader
//! never sees a truncated metadata file.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::{ArtifactCache, CacheError, validate_id};
use crate::record::ModRecord;

const METADATA_EXTENSION: &str = "json";
const IMAGE_EXTENSION: &str = "png";
const IMAGE_SUBDIR: &str = "tempimage";

/// Artifact cache stored as one file per blob.
#[derive(Debug, Clone)]
pub struct DiskCache {
    metadata_dir: PathBuf,
    image_dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache with explicit metadata and image directories.
    #[must_use]
    pub fn new(metadata_dir: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
            image_dir: image_dir.into(),
        }
    }

    /// Creates a cache rooted at `metadata_dir` with images in its `tempimage/` child.
    #[must_use]
    pub fn under(metadata_dir: impl Into<PathBuf>) -> Self {
        let metadata_dir = metadata_dir.into();
        let image_dir = metadata_dir.join(IMAGE_SUBDIR);
        Self {
            metadata_dir,
            image_dir,
        }
    }

    /// Directory holding metadata blobs.
    #[must_use]
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Directory holding image blobs.
    #[must_use]
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    fn metadata_path(&self, id: &str) -> Result<PathBuf, CacheError> {
        validate_id(id)?;
        Ok(self
            .metadata_dir
            .join(format!("{id}.{METADATA_EXTENSION}")))
    }

    fn image_path(&self, id: &str) -> Result<PathBuf, CacheError> {
        validate_id(id)?;
        Ok(self.image_dir.join(format!("{id}.{IMAGE_EXTENSION}")))
    }
}

#[async_trait]
impl ArtifactCache for DiskCache {
    async fn has_metadata(&self, id: &str) -> Result<bool, CacheError> {
        let path = self.metadata_path(id)?;
        fs::try_exists(&path)
            .await
            .map_err(|err| CacheError::io(&path, err))
    }

    async fn has_image(&self, id: &str) -> Result<bool, CacheError> {
        let path = self.image_path(id)?;
        fs::try_exists(&path)
            .await
            .map_err(|err| CacheError::io(&path, err))
    }

    async fn read_metadata(&self, id: &str) -> Result<ModRecord, CacheError> {
        let path = self.metadata_path(id)?;
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CacheError::NotFound { id: id.to_string() });
            }
            Err(err) => return Err(CacheError::io(&path, err)),
        };
        serde_json::from_slice(&raw).map_err(|err| CacheError::json(id, err))
    }

    #[instrument(level = "debug", skip(self, record), fields(id = %record.id))]
    async fn write_metadata(&self, record: &ModRecord) -> Result<(), CacheError> {
        let path = self.metadata_path(&record.id)?;
        let bytes =
            serde_json::to_vec_pretty(record).map_err(|err| CacheError::json(&record.id, err))?;
        write_atomic(&self.metadata_dir, &path, &bytes).await?;
        debug!(path = %path.display(), "metadata written");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, bytes), fields(bytes = bytes.len()))]
    async fn write_image(&self, id: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.image_path(id)?;
        write_atomic(&self.image_dir, &path, bytes).await?;
        debug!(path = %path.display(), "image written");
        Ok(())
    }

    async fn delete_metadata(&self, id: &str) -> Result<bool, CacheError> {
        let path = self.metadata_path(id)?;
        remove_if_present(&path).await
    }

    async fn delete_image(&self, id: &str) -> Result<bool, CacheError> {
        let path = self.image_path(id)?;
        remove_if_present(&path).await
    }

    async fn list_metadata_ids(&self) -> Result<BTreeSet<String>, CacheError> {
        list_ids(&self.metadata_dir, METADATA_EXTENSION).await
    }

    async fn list_image_ids(&self) -> Result<BTreeSet<String>, CacheError> {
        list_ids(&self.image_dir, IMAGE_EXTENSION).await
    }
}

async fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|err| CacheError::io(dir, err))?;

    let mut temp_path = path.to_path_buf().into_os_string();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let write_result = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(CacheError::io(&temp_path, err));
    }

    fs::rename(&temp_path, path)
        .await
        .map_err(|err| CacheError::io(path, err))
}

async fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(CacheError::io(path, err)),
    }
}

async fn list_ids(dir: &Path, extension: &str) -> Result<BTreeSet<String>, CacheError> {
    let mut ids = BTreeSet::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ids),
        Err(err) => return Err(CacheError::io(dir, err)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| CacheError::io(dir, err))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            && !stem.is_empty()
        {
            ids.insert(stem.to_string());
        }
    }
    Ok(ids)
}
