//! Reconciliation engine for a curation session.
//!
//! The engine owns the session's [`SelectionState`] and an in-memory copy of
//! the committed ledger, and drives the three durable collaborators:
//!
//! - a [`LedgerStore`] holding committed ids
//! - an [`ArtifactCache`] holding per-id metadata and images
//! - a [`Fetcher`] producing fresh records from the remote workshop
//!
//! # Flow
//!
//! ```text
//! scrape ─► classify ─► candidates / held ─► promote / demote ─► commit
//!                                                                  │
//!                         ledger.save(ledger ∪ held) ◄─────────────┘
//!                                     │
//!                                     ▼
//!                   evict orphans ─► detect gaps ─► re-fetch and write
//! ```
//!
//! The ledger only grows. A commit that cannot persist the merged ledger
//! returns [`EngineError::LedgerSave`] and leaves every in-memory view
//! unchanged. Cache and fetch problems after a successful save are recorded
//! in the [`RepairReport`] instead.

mod classify;
mod error;
mod repair;
mod report;

pub use error::EngineError;
pub use report::{
    ClassificationReport, CommitReport, LibraryEntry, Notice, RepairFailure, RepairReport,
    RepairStage,
};

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cache::ArtifactCache;
use crate::fetcher::Fetcher;
use crate::ledger::LedgerStore;
use crate::record::{ModStatus, RawItem};
use crate::selection::{DemoteAllOutcome, SelectionState, TransferError};

/// One curation session over a ledger, a cache and a fetcher.
pub struct ReconciliationEngine {
    ledger_store: Arc<dyn LedgerStore>,
    cache: Arc<dyn ArtifactCache>,
    fetcher: Arc<dyn Fetcher>,
    selection: SelectionState,
    ledger: BTreeSet<String>,
}

impl ReconciliationEngine {
    /// Opens a session, loading the committed ledger.
    ///
    /// An unreadable or corrupt ledger is logged and treated as empty; it is
    /// only overwritten by a later successful commit.
    #[tracing::instrument(skip_all)]
    pub async fn open(
        ledger_store: Arc<dyn LedgerStore>,
        cache: Arc<dyn ArtifactCache>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let ledger = match ledger_store.load().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "failed to load ledger, starting with an empty one");
                BTreeSet::new()
            }
        };
        info!(ledger_size = ledger.len(), "session opened");

        Self {
            ledger_store,
            cache,
            fetcher,
            selection: SelectionState::new(),
            ledger,
        }
    }

    /// Committed ids as of the last load or commit.
    #[must_use]
    pub fn ledger(&self) -> &BTreeSet<String> {
        &self.ledger
    }

    /// Current candidate and held pools.
    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Returns true if `id` is in the ledger.
    #[must_use]
    pub fn is_committed(&self, id: &str) -> bool {
        self.ledger.contains(id)
    }

    /// Fetches a collection and classifies its items.
    #[tracing::instrument(skip(self))]
    pub async fn scrape(&mut self, url: &str) -> ClassificationReport {
        let items = self.fetcher.fetch_collection(url).await;
        self.classify(items)
    }

    /// Sorts fetched items into the two pools against the ledger.
    ///
    /// Candidates are rebuilt from scratch; held records are only corrected.
    /// Running the same items twice leaves the selection unchanged.
    pub fn classify(&mut self, items: Vec<RawItem>) -> ClassificationReport {
        classify::classify(&mut self.selection, &self.ledger, items)
    }

    /// Moves a candidate into the held pool.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NotInCandidates`] if `id` is not a candidate.
    pub fn promote(&mut self, id: &str) -> Result<(), TransferError> {
        self.selection.promote(id)
    }

    /// Moves every candidate into the held pool.
    pub fn promote_all(&mut self) -> usize {
        self.selection.promote_all()
    }

    /// Moves a held record back to the candidate pool.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::AlreadyCommitted`] for ledger ids and
    /// [`TransferError::NotHeld`] when `id` is not held.
    pub fn demote(&mut self, id: &str) -> Result<(), TransferError> {
        let ledger = &self.ledger;
        self.selection.demote(id, |id| ledger.contains(id))
    }

    /// Demotes every held record not in the ledger.
    ///
    /// Returns a [`Notice::CommittedSkipped`] when committed records stayed.
    pub fn demote_all(&mut self) -> (DemoteAllOutcome, Option<Notice>) {
        let ledger = &self.ledger;
        let outcome = self.selection.demote_all(|id| ledger.contains(id));
        let notice = (outcome.skipped > 0).then(|| {
            warn!(skipped = outcome.skipped, "committed mods stayed on hold");
            Notice::CommittedSkipped {
                count: outcome.skipped,
            }
        });
        (outcome, notice)
    }

    /// Merges the held pool into the ledger, then repairs the cache.
    ///
    /// With an empty held pool this is a pure sync pass.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LedgerSave`] when the merged ledger cannot be
    /// written. No repair runs in that case.
    #[tracing::instrument(skip(self), fields(held = self.selection.held().len()))]
    pub async fn commit(&mut self) -> Result<CommitReport, EngineError> {
        let held: Vec<String> = self.selection.held_ids().map(str::to_string).collect();
        self.merge_and_repair(held).await
    }

    /// Adds externally sourced ids (such as a server INI) to the ledger, then
    /// repairs the cache. Empty ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LedgerSave`] when the merged ledger cannot be
    /// written.
    #[tracing::instrument(skip_all)]
    pub async fn import_ids<I>(&mut self, ids: I) -> Result<CommitReport, EngineError>
    where
        I: IntoIterator<Item = String> + Send,
    {
        let ids: Vec<String> = ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        self.merge_and_repair(ids).await
    }

    /// Repairs the cache against the current ledger without touching it.
    pub async fn repair(&self) -> RepairReport {
        repair::repair_cache(self.cache.as_ref(), self.fetcher.as_ref(), &self.ledger).await
    }

    /// Cached view of every committed id, in ledger order.
    #[tracing::instrument(skip(self))]
    pub async fn library(&self) -> Vec<LibraryEntry> {
        let mut entries = Vec::with_capacity(self.ledger.len());
        for id in &self.ledger {
            let record = match self.cache.read_metadata(id).await {
                Ok(record) => Some(record.with_status(ModStatus::Committed)),
                Err(e) => {
                    warn!(id = %id, error = %e, "no readable metadata for committed mod");
                    None
                }
            };
            let has_image = self.cache.has_image(id).await.unwrap_or(false);
            entries.push(LibraryEntry {
                id: id.clone(),
                record,
                has_image,
            });
        }
        entries
    }

    async fn merge_and_repair(&mut self, ids: Vec<String>) -> Result<CommitReport, EngineError> {
        let mut merged = self.ledger.clone();
        let added: Vec<String> = ids
            .into_iter()
            .filter(|id| merged.insert(id.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if !added.is_empty() {
            if let Err(e) = self.ledger_store.save(&merged).await {
                error!(error = %e, "ledger save failed, commit aborted");
                return Err(e.into());
            }
            info!(added = added.len(), ledger_size = merged.len(), "ledger updated");
            self.ledger = merged;
        }
        let ledger = &self.ledger;
        self.selection
            .retag_held(ModStatus::Committed, |id| ledger.contains(id));

        let repair = self.repair().await;
        Ok(CommitReport {
            added,
            ledger_size: self.ledger.len(),
            repair,
        })
    }
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("ledger_size", &self.ledger.len())
            .field("candidates", &self.selection.candidates().len())
            .field("held", &self.selection.held().len())
            .finish_non_exhaustive()
    }
}
