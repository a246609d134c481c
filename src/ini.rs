//! Import of workshop ids from a dedicated server INI file.
//!
//! Server configs list their mods on one or more `WorkshopItems=` lines:
//!
//! ```text
//! Mods=Hydrocraft;ExpandedHelicopterEvents
//! WorkshopItems=2392709985;2458631365
//! ```
//!
//! Only the ids are read. Merging them into the ledger is the engine's job
//! (see [`crate::engine::ReconciliationEngine::import_ids`]).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::ledger::LEDGER_KEY;

/// Errors reading a server INI.
#[derive(Debug, Error)]
pub enum IniError {
    /// The file could not be read.
    #[error("cannot read server INI {path}: {source}")]
    Io {
        /// INI path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file has no `WorkshopItems=` ids.
    #[error("no WorkshopItems= ids found in {path}")]
    NoIds {
        /// INI path.
        path: PathBuf,
    },
}

/// Collects ids from every `WorkshopItems=` line of `text`.
///
/// The key match is case-insensitive. Ids keep their first-seen order and
/// repeats are dropped.
#[must_use]
pub fn extract_workshop_ids(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for line in text.lines() {
        let line = line.trim_start();
        let Some(key) = line.get(..LEDGER_KEY.len()) else {
            continue;
        };
        if !key.eq_ignore_ascii_case(LEDGER_KEY) {
            continue;
        }
        for id in line[LEDGER_KEY.len()..].split(';') {
            let id = id.trim();
            if !id.is_empty() && seen.insert(id.to_string()) {
                ids.push(id.to_string());
            }
        }
    }

    ids
}

/// Reads `path` and extracts its workshop ids.
///
/// # Errors
///
/// Returns [`IniError::Io`] if the file cannot be read and
/// [`IniError::NoIds`] if it lists no ids.
#[tracing::instrument(fields(path = %path.display()))]
pub async fn read_server_ini(path: &Path) -> Result<Vec<String>, IniError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| IniError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let ids = extract_workshop_ids(&text);
    if ids.is_empty() {
        debug!("server INI lists no workshop ids");
        return Err(IniError::NoIds {
            path: path.to_path_buf(),
        });
    }
    info!(count = ids.len(), "workshop ids read from server INI");
    Ok(ids)
}
