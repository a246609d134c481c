//! Persisted ledger of committed workshop ids.
//!
//! The ledger is the durable record of every mod the user has committed. It is
//! loaded once when a session opens and written back only by a commit, which
//! is a set union: nothing in this crate removes an id from the ledger.
//!
//! - [`LedgerStore`] - async load/save seam used by the engine
//! - [`FileLedger`] - `WorkshopItems=` text file with atomic replace
//! - [`MemoryLedger`] - in-memory double for tests and dry runs

mod error;
mod file;
mod format;

pub use error::LedgerError;
pub use file::FileLedger;
pub use format::{LEDGER_KEY, format_ledger, parse_ledger};

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

/// Durable storage for the committed id set.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Loads the committed id set. A missing store is an empty set.
    async fn load(&self) -> Result<BTreeSet<String>, LedgerError>;

    /// Replaces the stored set with `ids`.
    ///
    /// Implementations must be atomic: a reader sees either the old or the
    /// new set, never a partial write.
    async fn save(&self, ids: &BTreeSet<String>) -> Result<(), LedgerError>;
}

/// Ledger held in memory. Clones share the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    ids: Arc<Mutex<BTreeSet<String>>>,
    fail_saves: bool,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger pre-populated with `ids`.
    #[must_use]
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Arc::new(Mutex::new(ids.into_iter().map(Into::into).collect())),
            fail_saves: false,
        }
    }

    /// Returns a ledger whose saves always fail (for error-path tests).
    #[must_use]
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Snapshot of the stored ids.
    #[must_use]
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.ids
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn load(&self) -> Result<BTreeSet<String>, LedgerError> {
        Ok(self.snapshot())
    }

    async fn save(&self, ids: &BTreeSet<String>) -> Result<(), LedgerError> {
        if self.fail_saves {
            return Err(LedgerError::io(
                "<memory>",
                std::io::Error::other("simulated ledger write failure"),
            ));
        }
        if let Ok(mut guard) = self.ids.lock() {
            guard.clone_from(ids);
        }
        Ok(())
    }
}
