//! Outcome types returned by engine operations.

use std::fmt;

use crate::record::ModRecord;

/// User-facing notice raised by an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Held records were found missing from the ledger and re-marked.
    ConflictsDetected {
        /// Affected ids, in held-pool order.
        ids: Vec<String>,
    },
    /// Demote-all left committed records in the held pool.
    CommittedSkipped {
        /// How many records stayed.
        count: usize,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictsDetected { ids } => write!(
                f,
                "{} held mod(s) are not in the library ledger and were marked as conflicts: {}",
                ids.len(),
                ids.join(", ")
            ),
            Self::CommittedSkipped { count } => write!(
                f,
                "{count} committed mod(s) stayed on hold; committed mods cannot be moved back"
            ),
        }
    }
}

/// Result of one classification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    /// Items placed in the candidate pool.
    pub new: usize,
    /// Items found in the ledger.
    pub committed: usize,
    /// Held items missing from the ledger.
    pub conflicts: usize,
    /// Items dropped for an empty or repeated id.
    pub skipped: usize,
    /// Notices to show the user.
    pub notices: Vec<Notice>,
}

/// Step of the repair pass at which a per-id failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStage {
    /// Listing cached ids.
    List,
    /// Deleting an orphaned blob.
    Evict,
    /// Checking whether a blob exists.
    Probe,
    /// The fetcher returned nothing for the id.
    Fetch,
    /// Writing the metadata blob.
    WriteMetadata,
    /// Downloading the preview image.
    DownloadImage,
    /// Writing the image blob.
    WriteImage,
}

impl RepairStage {
    /// Returns the stable string label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Evict => "evict",
            Self::Probe => "probe",
            Self::Fetch => "fetch",
            Self::WriteMetadata => "write_metadata",
            Self::DownloadImage => "download_image",
            Self::WriteImage => "write_image",
        }
    }
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure recorded during repair. Never aborts the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairFailure {
    /// Affected id; empty for store-wide failures such as listing.
    pub id: String,
    /// Where it failed.
    pub stage: RepairStage,
    /// Rendered error.
    pub reason: String,
}

/// What a cache repair pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Orphaned metadata blobs deleted.
    pub evicted_metadata: Vec<String>,
    /// Orphaned image blobs deleted.
    pub evicted_images: Vec<String>,
    /// Ledger ids that had no metadata blob.
    pub missing_metadata: Vec<String>,
    /// Ledger ids that had no image blob.
    pub missing_images: Vec<String>,
    /// Ids requested from the fetcher (sorted union of the two gaps).
    pub requested: Vec<String>,
    /// Metadata blobs written.
    pub metadata_written: Vec<String>,
    /// Image blobs written.
    pub images_written: Vec<String>,
    /// Per-id failures, in the order they happened.
    pub failures: Vec<RepairFailure>,
}

impl RepairReport {
    /// True when every gap was filled and nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(
        &mut self,
        id: impl Into<String>,
        stage: RepairStage,
        reason: impl fmt::Display,
    ) {
        self.failures.push(RepairFailure {
            id: id.into(),
            stage,
            reason: reason.to_string(),
        });
    }
}

/// Result of a successful commit or import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Ids newly added to the ledger, sorted.
    pub added: Vec<String>,
    /// Ledger size after the merge.
    pub ledger_size: usize,
    /// Cache repair that followed the merge.
    pub repair: RepairReport,
}

/// One row of the library view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    /// Ledger id.
    pub id: String,
    /// Cached metadata, when present and readable.
    pub record: Option<ModRecord>,
    /// Whether an image blob is cached.
    pub has_image: bool,
}
