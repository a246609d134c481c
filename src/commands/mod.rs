//! CLI command handlers.

mod config;
mod curate;
mod maintain;

pub(crate) use config::run_config_show_command;
pub(crate) use curate::{run_add_command, run_scrape_command};
pub(crate) use maintain::{run_import_ini_command, run_library_command, run_sync_command};
