//! Config command handlers: show effective configuration.

use crate::runtime::Settings;

pub(crate) fn run_config_show_command(settings: &Settings) {
    let resolved_path = settings.config_path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if settings.config_loaded {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("data_dir = {}", settings.data_dir.display());
    println!("fetch_concurrency = {}", settings.fetch_concurrency);
    println!("connect_timeout_secs = {}", settings.timeouts.connect_secs);
    println!("read_timeout_secs = {}", settings.timeouts.read_secs);
    println!("verbosity = {}", settings.verbosity.as_str());
}
