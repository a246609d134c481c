//! CLI entry point for the workshop curator.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use workshop_curator::RepairReport;

mod app_config;
mod cli;
mod commands;
mod output;
mod runtime;

use cli::{Cli, Command, ConfigCommand};
use runtime::Settings;

/// Process outcome mapped to an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested was done.
    Success,
    /// The ledger was updated but some cache entries could not be repaired.
    Partial,
}

impl ProcessExit {
    pub(crate) fn from_repair(report: &RepairReport) -> Self {
        if report.is_clean() {
            Self::Success
        } else {
            Self::Partial
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Partial => ExitCode::from(1),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let loaded = app_config::load_default_file_config()?;
    runtime::init_tracing(runtime::resolve_default_log_level(&cli, &loaded));
    debug!(?cli, "CLI arguments parsed");

    let settings = Settings::resolve(&cli, &loaded)?;
    debug!(?settings, "effective settings resolved");

    let exit = match &cli.command {
        Command::Scrape { url } => commands::run_scrape_command(&settings, url).await?,
        Command::Add(args) => commands::run_add_command(&settings, args).await?,
        Command::Sync => commands::run_sync_command(&settings).await?,
        Command::ImportIni { path } => commands::run_import_ini_command(&settings, path).await?,
        Command::Library => commands::run_library_command(&settings).await?,
        Command::Config {
            command: ConfigCommand::Show,
        } => {
            commands::run_config_show_command(&settings);
            ProcessExit::Success
        }
    };

    Ok(exit.into())
}
