//! File-backed ledger with atomic replacement on save.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::format::{format_ledger, parse_ledger};
use super::{LedgerError, LedgerStore};

/// Ledger stored as a single `WorkshopItems=` line in a text file.
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Creates a ledger backed by `path`. Nothing is touched until load/save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Moves an existing file that does not parse as a ledger out of the way
    /// so a save never overwrites ids that could not be read.
    async fn set_aside_unreadable(&self) -> Result<(), LedgerError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(LedgerError::io(&self.path, err)),
        };
        if let Ok(raw) = std::str::from_utf8(&bytes)
            && (is_blank(raw) || parse_ledger(raw).is_some())
        {
            return Ok(());
        }

        let mut backup = self.sibling_path(".corrupt");
        let mut attempt = 1;
        while fs::try_exists(&backup)
            .await
            .map_err(|err| LedgerError::io(&backup, err))?
        {
            backup = self.sibling_path(&format!(".corrupt.{attempt}"));
            attempt += 1;
        }
        fs::rename(&self.path, &backup)
            .await
            .map_err(|err| LedgerError::io(&backup, err))?;
        warn!(backup = %backup.display(), "unreadable ledger set aside before save");
        Ok(())
    }
}

fn is_blank(raw: &str) -> bool {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}

#[async_trait]
impl LedgerStore for FileLedger {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<BTreeSet<String>, LedgerError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("ledger file absent, starting empty");
                return Ok(BTreeSet::new());
            }
            Err(err) => return Err(LedgerError::io(&self.path, err)),
        };

        if is_blank(&raw) {
            return Ok(BTreeSet::new());
        }

        let ids = parse_ledger(&raw).ok_or_else(|| {
            LedgerError::malformed(&self.path, "missing `WorkshopItems=` record")
        })?;
        debug!(count = ids.len(), "ledger loaded");
        Ok(ids)
    }

    #[instrument(level = "debug", skip(self, ids), fields(path = %self.path.display(), count = ids.len()))]
    async fn save(&self, ids: &BTreeSet<String>) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| LedgerError::io(parent, err))?;
        }

        self.set_aside_unreadable().await?;

        let temp_path = self.temp_path();
        let contents = format_ledger(ids);
        let write_result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(contents.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = write_result {
            // Leave no stray temp file behind; the real ledger is untouched.
            let _ = fs::remove_file(&temp_path).await;
            return Err(LedgerError::io(&temp_path, err));
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|err| LedgerError::io(&self.path, err))?;
        debug!("ledger saved");
        Ok(())
    }
}
