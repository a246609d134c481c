//! Workshop item records and their reconciliation status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title used when a scrape yields no title.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Author used when a scrape yields no author.
pub const UNKNOWN_AUTHOR: &str = "Unbekannter Autor";
/// Description used when a scrape yields no description.
pub const UNKNOWN_DESCRIPTION: &str = "Keine Beschreibung verfügbar.";

/// Reconciliation status of a record in the current session.
///
/// Computed by classification and manual transfers; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModStatus {
    /// Not in the ledger and not held.
    #[default]
    New,
    /// Present in the ledger.
    Committed,
    /// Held by the user but absent from the ledger.
    Conflict,
}

impl ModStatus {
    /// Returns the stable string label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Committed => "committed",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for ModStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A workshop item as returned by a fetcher, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// Workshop item id (may be empty if the source page was malformed).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Display author.
    pub author: String,
    /// Short description text.
    pub short_description: String,
    /// Link to the workshop item page.
    pub workshop_link: String,
    /// Preview image URL, empty when the page had none.
    pub image_url: String,
}

impl RawItem {
    /// Creates an item carrying only an id, with placeholder display fields.
    #[must_use]
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            short_description: UNKNOWN_DESCRIPTION.to_string(),
            workshop_link: String::new(),
            image_url: String::new(),
        }
    }
}

/// One workshop item tracked by a curation session.
///
/// The JSON form is the cached metadata blob; field names match the
/// `WorkshopObjects/<id>.json` files written by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModRecord {
    /// Unique key across selection, ledger and cache.
    pub id: String,
    /// Display title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Display author.
    #[serde(default = "default_author")]
    pub author: String,
    /// Short description text.
    #[serde(default = "default_description")]
    pub short_description: String,
    /// Link to the workshop item page.
    #[serde(default)]
    pub workshop_link: String,
    /// Preview image URL.
    #[serde(default)]
    pub image_url: String,
    /// Session status.
    #[serde(skip)]
    pub status: ModStatus,
}

impl ModRecord {
    /// Builds a `New` record from fetcher output.
    #[must_use]
    pub fn from_raw(raw: RawItem) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            author: raw.author,
            short_description: raw.short_description,
            workshop_link: raw.workshop_link,
            image_url: raw.image_url,
            status: ModStatus::New,
        }
    }

    /// Returns a copy of this record tagged with `status`.
    #[must_use]
    pub fn with_status(mut self, status: ModStatus) -> Self {
        self.status = status;
        self
    }
}

impl From<RawItem> for ModRecord {
    fn from(raw: RawItem) -> Self {
        Self::from_raw(raw)
    }
}

fn default_title() -> String {
    UNKNOWN_TITLE.to_string()
}

fn default_author() -> String {
    UNKNOWN_AUTHOR.to_string()
}

fn default_description() -> String {
    UNKNOWN_DESCRIPTION.to_string()
}
