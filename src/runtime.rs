//! Effective settings, tracing setup and session construction for the binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use workshop_curator::{
    DEFAULT_FETCH_CONCURRENCY, DataLayout, HttpTimeouts, ReconciliationEngine,
    SteamWorkshopFetcher,
};

use crate::app_config::{self, LoadedConfig, VerbositySetting};
use crate::cli::Cli;

/// Settings after merging CLI flags over the config file over defaults.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub data_dir: PathBuf,
    pub fetch_concurrency: usize,
    pub timeouts: HttpTimeouts,
    pub verbosity: VerbositySetting,
    pub steam_base_url: Option<String>,
    pub config_path: Option<PathBuf>,
    pub config_loaded: bool,
}

impl Settings {
    /// Resolves effective settings. CLI flags win over file values.
    pub(crate) fn resolve(cli: &Cli, loaded: &LoadedConfig) -> Result<Self> {
        let file = loaded.config.clone().unwrap_or_default();
        let defaults = HttpTimeouts::default();

        let data_dir = match cli.data_dir.clone().or(file.data_dir) {
            Some(dir) => dir,
            None => app_config::resolve_default_data_dir().context(
                "Cannot determine a data directory (HOME is unset); pass --data-dir",
            )?,
        };

        let verbosity = if cli.quiet {
            VerbositySetting::Quiet
        } else if cli.verbose > 0 {
            VerbositySetting::Verbose
        } else {
            file.verbosity.unwrap_or(VerbositySetting::Default)
        };

        Ok(Self {
            data_dir,
            fetch_concurrency: cli
                .fetch_concurrency
                .map(usize::from)
                .or(file.fetch_concurrency)
                .unwrap_or(DEFAULT_FETCH_CONCURRENCY),
            timeouts: HttpTimeouts {
                connect_secs: file.connect_timeout_secs.unwrap_or(defaults.connect_secs),
                read_secs: file.read_timeout_secs.unwrap_or(defaults.read_secs),
            },
            verbosity,
            steam_base_url: cli.steam_base_url.clone(),
            config_path: loaded.path.clone(),
            config_loaded: loaded.loaded_from_file(),
        })
    }

    /// Opens a curation session over the configured data directory.
    pub(crate) async fn open_engine(&self) -> Result<ReconciliationEngine> {
        let layout = DataLayout::new(&self.data_dir);
        let mut fetcher = SteamWorkshopFetcher::with_settings(self.timeouts, self.fetch_concurrency)
            .context("Failed to build the workshop HTTP client")?;
        if let Some(base_url) = &self.steam_base_url {
            fetcher = fetcher.with_base_url(base_url.clone());
        }

        Ok(ReconciliationEngine::open(
            Arc::new(layout.ledger()),
            Arc::new(layout.cache()),
            Arc::new(fetcher),
        )
        .await)
    }
}

/// Default log level.
///
/// Priority: quiet flag > verbose count > config verbosity > info.
/// `RUST_LOG`, when set, overrides all of them in [`init_tracing`].
pub(crate) fn resolve_default_log_level(cli: &Cli, loaded: &LoadedConfig) -> &'static str {
    if cli.quiet {
        return "error";
    }
    match cli.verbose {
        0 => loaded
            .config
            .as_ref()
            .and_then(|config| config.verbosity)
            .map_or("info", VerbositySetting::log_level),
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
