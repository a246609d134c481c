//! Error types for the artifact cache.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by artifact cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// File system error reading, writing or deleting a blob.
    #[error("IO error on cache blob {path}: {source}")]
    Io {
        /// The blob path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be serialized or parsed.
    #[error("metadata JSON error for mod {id}: {source}")]
    Json {
        /// The mod id whose metadata failed.
        id: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The id cannot be used as a blob file name.
    #[error("invalid cache id {id:?}")]
    InvalidId {
        /// The rejected id.
        id: String,
    },

    /// No metadata blob exists for the id.
    #[error("no cached metadata for mod {id}")]
    NotFound {
        /// The requested id.
        id: String,
    },
}

impl CacheError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error.
    pub fn json(id: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            id: id.into(),
            source,
        }
    }
}
