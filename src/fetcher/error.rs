//! Error types for workshop page and image fetches.
//!
//! These errors stay inside the fetcher for page scrapes: a failed collection
//! or item page degrades to "no data" and is logged. Image downloads surface
//! them to the repair pass, which records the gap and moves on.

use thiserror::Error;

/// Errors that can occur while fetching workshop pages or images.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connect, TLS, body read).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL could not be parsed or built.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The item has no image URL to download.
    #[error("mod {id} has no preview image URL")]
    NoImage {
        /// The mod id.
        id: String,
    },

    /// HTTP client construction failed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// Description of the failure.
        reason: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
