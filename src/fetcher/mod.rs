//! Remote fetcher for workshop collections, items and preview images.
//!
//! The engine treats fetching as an opaque capability behind the [`Fetcher`]
//! trait. Implementations follow partial-success semantics:
//!
//! - one malformed item is skipped and logged, the batch continues
//! - a collection page that cannot be fetched yields an empty list
//! - nothing here panics or aborts a batch because of one bad record
//!
//! # Architecture
//!
//! - [`Fetcher`] - async trait used by the engine (object safe via `async_trait`)
//! - [`SteamWorkshopFetcher`] - Steam Community scraper over `reqwest`
//! - [`StaticFetcher`] - in-memory fetcher for tests and offline runs
//!
//! # Example
//!
//! ```no_run
//! use workshop_curator::fetcher::{Fetcher, SteamWorkshopFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = SteamWorkshopFetcher::new()?;
//! let items = fetcher
//!     .fetch_collection("https://steamcommunity.com/sharedfiles/filedetails/?id=2488452435")
//!     .await;
//! println!("{} items", items.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
pub mod scrape;
mod steam;

pub use error::FetchError;
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts,
    build_fetcher_http_client,
};
pub use steam::{DEFAULT_FETCH_CONCURRENCY, SteamWorkshopFetcher};

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::record::RawItem;

/// Source of workshop item records and images.
///
/// # Object Safety
///
/// Uses `async_trait` so the engine can hold a `Box<dyn Fetcher>`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches every item of a collection page.
    ///
    /// Never fails: an unreachable page yields an empty list (logged).
    async fn fetch_collection(&self, url: &str) -> Vec<RawItem>;

    /// Fetches the given items by id, in request order.
    ///
    /// Ids that fail to fetch are omitted (logged).
    async fn fetch_by_ids(&self, ids: &[String]) -> Vec<RawItem>;

    /// Downloads the preview image bytes for `item`.
    async fn download_image(&self, item: &RawItem) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Default)]
struct StaticState {
    collections: BTreeMap<String, Vec<RawItem>>,
    items: BTreeMap<String, RawItem>,
    images: BTreeMap<String, Vec<u8>>,
    requested_ids: Vec<Vec<String>>,
    unavailable: HashSet<String>,
}

/// Fetcher serving pre-registered collections, items and images from memory.
///
/// Records every `fetch_by_ids` request so tests can assert exactly what a
/// repair pass asked for. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    state: Arc<Mutex<StaticState>>,
}

impl StaticFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the items a collection URL returns.
    #[must_use]
    pub fn with_collection(self, url: impl Into<String>, items: Vec<RawItem>) -> Self {
        self.with_state(|state| {
            state.collections.insert(url.into(), items);
        });
        self
    }

    /// Registers an item served by `fetch_by_ids`.
    #[must_use]
    pub fn with_item(self, item: RawItem) -> Self {
        self.with_state(|state| {
            state.items.insert(item.id.clone(), item);
        });
        self
    }

    /// Registers image bytes for an id.
    #[must_use]
    pub fn with_image(self, id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.with_state(|state| {
            state.images.insert(id.into(), bytes.into());
        });
        self
    }

    /// Makes `id` fail to fetch by id (simulates a degraded remote).
    #[must_use]
    pub fn with_unavailable(self, id: impl Into<String>) -> Self {
        self.with_state(|state| {
            state.unavailable.insert(id.into());
        });
        self
    }

    /// Every id batch passed to `fetch_by_ids`, in call order.
    #[must_use]
    pub fn requested_ids(&self) -> Vec<Vec<String>> {
        self.with_state(|state| state.requested_ids.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StaticState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_collection(&self, url: &str) -> Vec<RawItem> {
        self.with_state(|state| state.collections.get(url).cloned().unwrap_or_default())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Vec<RawItem> {
        self.with_state(|state| {
            state.requested_ids.push(ids.to_vec());
            ids.iter()
                .filter(|id| !state.unavailable.contains(*id))
                .filter_map(|id| state.items.get(id).cloned())
                .collect()
        })
    }

    async fn download_image(&self, item: &RawItem) -> Result<Vec<u8>, FetchError> {
        self.with_state(|state| state.images.get(&item.id).cloned())
            .ok_or_else(|| FetchError::NoImage {
                id: item.id.clone(),
            })
    }
}
