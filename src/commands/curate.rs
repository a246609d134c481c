//! Scrape and add: the collection-driven curation flow.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::AddArgs;
use crate::runtime::Settings;
use crate::{ProcessExit, output};

pub(crate) async fn run_scrape_command(settings: &Settings, url: &str) -> Result<ProcessExit> {
    let mut engine = settings.open_engine().await?;
    let report = engine.scrape(url).await;

    output::print_classification(&report);
    output::print_selection(engine.selection());
    Ok(ProcessExit::Success)
}

pub(crate) async fn run_add_command(settings: &Settings, args: &AddArgs) -> Result<ProcessExit> {
    let mut engine = settings.open_engine().await?;
    let report = engine.scrape(&args.url).await;
    output::print_classification(&report);

    if args.all {
        let moved = engine.promote_all();
        info!(moved, "promoted every new mod");
    } else {
        for id in &args.ids {
            if engine.is_committed(id) {
                println!("{id} is already in the library");
                continue;
            }
            engine
                .promote(id)
                .with_context(|| format!("Cannot add {id} from {}", args.url))?;
        }
    }

    let commit = engine.commit().await.context("Commit failed")?;
    output::print_commit_report(&commit);
    Ok(ProcessExit::from_repair(&commit.repair))
}
