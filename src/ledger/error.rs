//! Error types for ledger persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving the committed-id ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// File system error reading, writing or renaming the ledger file.
    #[error("IO error on ledger {path}: {source}")]
    Io {
        /// The ledger (or its temporary sibling) path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger file exists but does not contain a `WorkshopItems=` record.
    #[error("malformed ledger {path}: {reason}")]
    Malformed {
        /// The ledger path.
        path: PathBuf,
        /// What was wrong with the contents.
        reason: String,
    },
}

impl LedgerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed-contents error.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
