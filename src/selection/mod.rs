//! Two-pool selection state manipulated during a curation session.
//!
//! A session keeps *candidates* (freshly scraped, not yet chosen) apart from
//! *held* records (chosen by the user or already in the ledger). Both pools are
//! ordered and keyed by id:
//!
//! - an id appears in at most one pool
//! - no id appears twice within a pool
//! - records with an empty id are never admitted
//!
//! Every mutator below preserves those three rules; callers never see a
//! partially moved record.

mod error;

pub use error::TransferError;

use tracing::{debug, warn};

use crate::record::{ModRecord, ModStatus};

/// Outcome of moving every eligible held record back to the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemoteAllOutcome {
    /// Records moved to the candidate pool.
    pub moved: usize,
    /// Committed records left in the held pool.
    pub skipped: usize,
}

/// Candidate and held pools for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    candidates: Vec<ModRecord>,
    held: Vec<ModRecord>,
}

impl SelectionState {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records not yet chosen, in scrape order.
    #[must_use]
    pub fn candidates(&self) -> &[ModRecord] {
        &self.candidates
    }

    /// Records the user is holding, in the order they were added.
    #[must_use]
    pub fn held(&self) -> &[ModRecord] {
        &self.held
    }

    /// Returns the held record with `id`, if any.
    #[must_use]
    pub fn held_record(&self, id: &str) -> Option<&ModRecord> {
        self.held.iter().find(|record| record.id == id)
    }

    /// Returns the candidate record with `id`, if any.
    #[must_use]
    pub fn candidate(&self, id: &str) -> Option<&ModRecord> {
        self.candidates.iter().find(|record| record.id == id)
    }

    /// Returns true if `id` is in the held pool.
    #[must_use]
    pub fn is_held(&self, id: &str) -> bool {
        self.held_record(id).is_some()
    }

    /// Returns true if `id` is in the candidate pool.
    #[must_use]
    pub fn is_candidate(&self, id: &str) -> bool {
        self.candidate(id).is_some()
    }

    /// Ids of every held record, in pool order.
    pub fn held_ids(&self) -> impl Iterator<Item = &str> {
        self.held.iter().map(|record| record.id.as_str())
    }

    /// Moves one candidate into the held pool.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NotInCandidates`] if `id` is not a candidate.
    pub fn promote(&mut self, id: &str) -> Result<(), TransferError> {
        let Some(index) = self.candidates.iter().position(|record| record.id == id) else {
            warn!(id, "promote rejected: not a candidate");
            return Err(TransferError::NotInCandidates { id: id.to_string() });
        };
        let record = self.candidates.remove(index);
        debug!(id, "promoted to held");
        self.held.push(record);
        Ok(())
    }

    /// Moves every candidate into the held pool and returns how many moved.
    pub fn promote_all(&mut self) -> usize {
        let moved = self.candidates.len();
        self.held.append(&mut self.candidates);
        debug!(moved, "promoted all candidates");
        moved
    }

    /// Moves one held record back to the candidate pool.
    ///
    /// `is_committed` reports ledger membership; committed records stay held.
    /// A `Conflict` record is reset to `New` on the way out.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::AlreadyCommitted`] for ledger ids and
    /// [`TransferError::NotHeld`] when `id` is not held.
    pub fn demote(
        &mut self,
        id: &str,
        is_committed: impl Fn(&str) -> bool,
    ) -> Result<(), TransferError> {
        if is_committed(id) {
            warn!(id, "demote rejected: already committed");
            return Err(TransferError::AlreadyCommitted { id: id.to_string() });
        }
        let Some(index) = self.held.iter().position(|record| record.id == id) else {
            warn!(id, "demote rejected: not held");
            return Err(TransferError::NotHeld { id: id.to_string() });
        };
        let record = self.held.remove(index);
        self.candidates.push(reset_conflict(record));
        debug!(id, "demoted to candidates");
        Ok(())
    }

    /// Demotes every held record that is not committed.
    pub fn demote_all(&mut self, is_committed: impl Fn(&str) -> bool) -> DemoteAllOutcome {
        let mut outcome = DemoteAllOutcome::default();
        let mut kept = Vec::with_capacity(self.held.len());
        for record in std::mem::take(&mut self.held) {
            if is_committed(&record.id) {
                outcome.skipped += 1;
                kept.push(record);
            } else {
                outcome.moved += 1;
                self.candidates.push(reset_conflict(record));
            }
        }
        self.held = kept;
        debug!(
            moved = outcome.moved,
            skipped = outcome.skipped,
            "demoted all eligible held records"
        );
        outcome
    }

    /// Drops every candidate ahead of a fresh classification pass.
    pub(crate) fn clear_candidates(&mut self) {
        self.candidates.clear();
    }

    /// Appends a candidate; returns false if the id is empty or already tracked.
    pub(crate) fn add_candidate(&mut self, record: ModRecord) -> bool {
        if record.id.is_empty() || self.is_candidate(&record.id) || self.is_held(&record.id) {
            return false;
        }
        self.candidates.push(record);
        true
    }

    /// Appends a held record; returns false if the id is empty or already held.
    ///
    /// A candidate with the same id is removed so the pools stay disjoint.
    pub(crate) fn add_held(&mut self, record: ModRecord) -> bool {
        if record.id.is_empty() || self.is_held(&record.id) {
            return false;
        }
        self.candidates.retain(|candidate| candidate.id != record.id);
        self.held.push(record);
        true
    }

    /// Removes the held entry with the same id and re-adds `record` at the
    /// end of the held pool.
    ///
    /// Returns false (and changes nothing) when no such entry exists.
    pub(crate) fn requeue_held(&mut self, record: ModRecord) -> bool {
        let Some(index) = self.held.iter().position(|held| held.id == record.id) else {
            return false;
        };
        self.held.remove(index);
        self.held.push(record);
        true
    }

    /// Re-tags every held record whose id satisfies `predicate`.
    pub(crate) fn retag_held(&mut self, status: ModStatus, predicate: impl Fn(&str) -> bool) {
        for record in &mut self.held {
            if predicate(&record.id) {
                record.status = status;
            }
        }
    }
}

fn reset_conflict(mut record: ModRecord) -> ModRecord {
    if record.status == ModStatus::Conflict {
        record.status = ModStatus::New;
    }
    record
}
