//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Curate Steam Workshop collections into a persisted mod library.
///
/// Scrapes a collection, sorts its items against the committed library,
/// and keeps the local metadata and preview-image cache in step with it.
#[derive(Parser, Debug)]
#[command(name = "workshop-curator")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data directory holding WorkshopID.txt and WorkshopObjects/
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Item pages fetched concurrently while repairing the cache (1-16)
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub fetch_concurrency: Option<u8>,

    /// Base URL for workshop item pages
    #[arg(long, global = true, hide = true, value_name = "URL")]
    pub steam_base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scrape a collection and show how its mods sort against the library
    Scrape {
        /// Workshop collection URL
        url: String,
    },
    /// Scrape a collection, pick mods and commit them to the library
    Add(AddArgs),
    /// Evict orphaned cache entries and re-fetch missing ones
    Sync,
    /// Merge the WorkshopItems= ids of a server INI into the library
    ImportIni {
        /// Path to the server INI file
        path: PathBuf,
    },
    /// List committed mods with their cached details
    Library,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `add`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    /// Workshop collection URL
    pub url: String,

    /// Workshop id to commit (repeatable)
    #[arg(long = "id", value_name = "ID", required_unless_present = "all")]
    pub ids: Vec<String>,

    /// Commit every new mod of the collection
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_scrape_parses_url() {
        let cli = Cli::try_parse_from(["workshop-curator", "scrape", "https://x/?id=1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Scrape {
                url: "https://x/?id=1".to_string()
            }
        );
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "workshop-curator",
            "sync",
            "-vv",
            "--data-dir",
            "/tmp/curator",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/curator")));
    }

    #[test]
    fn test_cli_add_repeated_ids() {
        let cli = Cli::try_parse_from([
            "workshop-curator",
            "add",
            "https://x/?id=1",
            "--id",
            "10",
            "--id",
            "11",
        ])
        .unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.ids, vec!["10", "11"]);
        assert!(!args.all);
    }

    #[test]
    fn test_cli_add_requires_ids_or_all() {
        let result = Cli::try_parse_from(["workshop-curator", "add", "https://x/?id=1"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["workshop-curator", "add", "https://x/?id=1", "--all"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_add_all_conflicts_with_ids() {
        let result = Cli::try_parse_from([
            "workshop-curator",
            "add",
            "https://x/?id=1",
            "--all",
            "--id",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_fetch_concurrency_range() {
        assert!(Cli::try_parse_from(["workshop-curator", "sync", "--fetch-concurrency", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["workshop-curator", "sync", "--fetch-concurrency", "17"]).is_err()
        );
        let cli =
            Cli::try_parse_from(["workshop-curator", "sync", "--fetch-concurrency", "16"]).unwrap();
        assert_eq!(cli.fetch_concurrency, Some(16));
    }

    #[test]
    fn test_cli_subcommand_required() {
        assert!(Cli::try_parse_from(["workshop-curator"]).is_err());
    }

    #[test]
    fn test_cli_config_show() {
        let cli = Cli::try_parse_from(["workshop-curator", "config", "show"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Config {
                command: ConfigCommand::Show
            }
        );
    }
}
