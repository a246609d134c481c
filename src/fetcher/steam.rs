//! Steam Community scraper implementing [`Fetcher`].

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use reqwest::Client;
use tracing::{debug, error, info, warn};
use url::Url;

use super::http_client::{HttpTimeouts, build_fetcher_http_client};
use super::scrape::{collection_item_blocks, parse_collection_item, parse_item_page};
use super::{FetchError, Fetcher};
use crate::record::RawItem;

/// Default Steam Community base URL.
const DEFAULT_BASE_URL: &str = "https://steamcommunity.com";

/// Default number of item pages fetched concurrently.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Fetches workshop collections, item pages and preview images from Steam.
pub struct SteamWorkshopFetcher {
    client: Client,
    base_url: String,
    concurrency: usize,
}

impl SteamWorkshopFetcher {
    /// Creates a fetcher with default timeouts and concurrency.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if HTTP client construction fails.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(HttpTimeouts::default(), DEFAULT_FETCH_CONCURRENCY)
    }

    /// Creates a fetcher with explicit timeouts and item-page concurrency.
    ///
    /// A concurrency of zero is treated as one.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if HTTP client construction fails.
    #[tracing::instrument(skip_all, fields(concurrency))]
    pub fn with_settings(timeouts: HttpTimeouts, concurrency: usize) -> Result<Self, FetchError> {
        let client = build_fetcher_http_client(timeouts)?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: concurrency.max(1),
        })
    }

    /// Overrides the base URL used for item pages (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Item page URL for a workshop id.
    #[must_use]
    pub fn item_url(&self, id: &str) -> String {
        format!("{}/sharedfiles/filedetails/?id={id}", self.base_url)
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        response.text().await.map_err(|e| FetchError::network(url, e))
    }

    async fn fetch_item(&self, id: &str) -> Result<RawItem, FetchError> {
        let url = self.item_url(id);
        let html = self.get_text(&url).await?;
        Ok(parse_item_page(&html, id, &url))
    }
}

impl std::fmt::Debug for SteamWorkshopFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamWorkshopFetcher")
            .field("base_url", &self.base_url)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for SteamWorkshopFetcher {
    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn fetch_collection(&self, url: &str) -> Vec<RawItem> {
        if Url::parse(url).is_err() {
            error!("collection URL is not a valid absolute URL");
            return Vec::new();
        }

        let html = match self.get_text(url).await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "failed to fetch collection page");
                return Vec::new();
            }
        };

        let blocks = collection_item_blocks(&html);
        let mut items = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.into_iter().enumerate() {
            match parse_collection_item(block) {
                Some(item) => items.push(item),
                None => warn!(index, "skipping collection item without a workshop id"),
            }
        }

        info!(count = items.len(), "collection scraped");
        items
    }

    #[tracing::instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn fetch_by_ids(&self, ids: &[String]) -> Vec<RawItem> {
        let mut results: Vec<(usize, Result<RawItem, FetchError>)> =
            stream::iter(ids.iter().cloned().enumerate())
                .map(|(index, id)| async move { (index, self.fetch_item(&id).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);

        let mut items = Vec::with_capacity(results.len());
        for (index, result) in results {
            match result {
                Ok(item) => items.push(item),
                Err(e) => error!(id = %ids[index], error = %e, "failed to fetch workshop item"),
            }
        }

        debug!(fetched = items.len(), "item pages fetched");
        items
    }

    #[tracing::instrument(skip(self, item), fields(id = %item.id))]
    async fn download_image(&self, item: &RawItem) -> Result<Vec<u8>, FetchError> {
        if item.image_url.trim().is_empty() {
            return Err(FetchError::NoImage {
                id: item.id.clone(),
            });
        }
        let url = item.image_url.trim();
        if Url::parse(url).is_err() {
            return Err(FetchError::invalid_url(url));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let mut bytes = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
            bytes.extend_from_slice(&chunk);
        }

        debug!(bytes = bytes.len(), "preview image downloaded");
        Ok(bytes)
    }
}
