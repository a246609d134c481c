//! On-disk layout of a curator data directory.
//!
//! ```text
//! <root>/
//! ├── WorkshopID.txt          committed-id ledger
//! └── WorkshopObjects/
//!     ├── <id>.json           cached metadata
//!     └── tempimage/<id>.png  cached preview image
//! ```

use std::path::{Path, PathBuf};

use crate::cache::DiskCache;
use crate::ledger::FileLedger;

/// Ledger file name.
pub const LEDGER_FILE: &str = "WorkshopID.txt";
/// Metadata directory name.
pub const OBJECTS_DIR: &str = "WorkshopObjects";

/// Paths of the ledger and artifact cache under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Creates a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the ledger file.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    /// Directory holding metadata blobs.
    #[must_use]
    pub fn objects_dir(&self) -> PathBuf {
        self.root.join(OBJECTS_DIR)
    }

    /// File ledger at [`Self::ledger_path`].
    #[must_use]
    pub fn ledger(&self) -> FileLedger {
        FileLedger::new(self.ledger_path())
    }

    /// Disk cache under [`Self::objects_dir`].
    #[must_use]
    pub fn cache(&self) -> DiskCache {
        DiskCache::under(self.objects_dir())
    }
}
