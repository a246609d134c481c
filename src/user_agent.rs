//! Shared User-Agent string for workshop page and image requests.
//!
//! Single source for project URL and UA format so scrape and image traffic
//! stay consistent and easy to update.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/workshop-curator";

/// Default User-Agent for every fetcher request.
#[must_use]
pub(crate) fn default_fetcher_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("workshop-curator/{version} (mod-library-tool; +{PROJECT_UA_URL})")
}
