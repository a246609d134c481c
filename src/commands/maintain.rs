//! Library maintenance: sync, server INI import and the library listing.

use std::path::Path;

use anyhow::{Context, Result};
use workshop_curator::read_server_ini;

use crate::runtime::Settings;
use crate::{ProcessExit, output};

pub(crate) async fn run_sync_command(settings: &Settings) -> Result<ProcessExit> {
    let mut engine = settings.open_engine().await?;
    let commit = engine.commit().await.context("Sync failed")?;
    output::print_commit_report(&commit);
    Ok(ProcessExit::from_repair(&commit.repair))
}

pub(crate) async fn run_import_ini_command(settings: &Settings, path: &Path) -> Result<ProcessExit> {
    let ids = read_server_ini(path).await?;
    println!("Found {} workshop id(s) in {}", ids.len(), path.display());

    let mut engine = settings.open_engine().await?;
    let commit = engine.import_ids(ids).await.context("Import failed")?;
    output::print_commit_report(&commit);
    Ok(ProcessExit::from_repair(&commit.repair))
}

pub(crate) async fn run_library_command(settings: &Settings) -> Result<ProcessExit> {
    let engine = settings.open_engine().await?;
    let entries = engine.library().await;
    output::print_library(&entries);
    Ok(ProcessExit::Success)
}
