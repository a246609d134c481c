//! Errors that abort an engine operation.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Failure of a ledger-mutating engine operation.
///
/// Cache and fetch problems never surface here: they are logged per id and
/// collected in a [`super::RepairReport`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The merged ledger could not be persisted; nothing was changed.
    #[error("failed to save ledger: {source}")]
    LedgerSave {
        /// The underlying ledger error.
        #[source]
        source: LedgerError,
    },
}

impl From<LedgerError> for EngineError {
    fn from(source: LedgerError) -> Self {
        Self::LedgerSave { source }
    }
}
