//! Error types for manual selection transfers.

use thiserror::Error;

/// A user-driven transfer that was rejected.
///
/// Rejections leave the selection unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Promote was requested for an id that is not a candidate.
    #[error("mod {id} is not in the candidate pool")]
    NotInCandidates {
        /// Requested id.
        id: String,
    },

    /// Demote was requested for an id that is not held.
    #[error("mod {id} is not in the held pool")]
    NotHeld {
        /// Requested id.
        id: String,
    },

    /// Demote was requested for an id that is already in the ledger.
    #[error("mod {id} is already committed to the library and cannot be put back on hold")]
    AlreadyCommitted {
        /// Requested id.
        id: String,
    },
}

impl TransferError {
    /// Returns the id the rejected action targeted.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::NotInCandidates { id } | Self::NotHeld { id } | Self::AlreadyCommitted { id } => id,
        }
    }

    /// Short machine-readable reason label.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotInCandidates { .. } => "not_in_candidates",
            Self::NotHeld { .. } => "not_held",
            Self::AlreadyCommitted { .. } => "already_committed",
        }
    }
}
