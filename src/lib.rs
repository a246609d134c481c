//! Workshop Curator Library
//!
//! Reconciles three views of a Steam Workshop mod selection:
//!
//! - items freshly scraped from a collection page
//! - the session's two-pool selection (candidates and held)
//! - the durable ledger of committed ids plus its metadata/image cache
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`record`] - Mod records and their session status
//! - [`fetcher`] - Remote fetcher for collections, item pages and images
//! - [`cache`] - Artifact cache for metadata and preview images
//! - [`ledger`] - Persisted ledger of committed ids
//! - [`selection`] - Candidate and held pools
//! - [`engine`] - Classification, transfers, commit and cache repair
//! - [`ini`] - Workshop id import from server INI files
//! - [`layout`] - Data directory layout

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod engine;
pub mod fetcher;
pub mod ini;
pub mod layout;
pub mod ledger;
pub mod record;
pub mod selection;
mod user_agent;

// Re-export commonly used types
pub use cache::{ArtifactCache, CacheError, DiskCache, MemoryCache};
pub use engine::{
    ClassificationReport, CommitReport, EngineError, LibraryEntry, Notice, ReconciliationEngine,
    RepairFailure, RepairReport, RepairStage,
};
pub use fetcher::{
    DEFAULT_FETCH_CONCURRENCY, FetchError, Fetcher, HttpTimeouts, StaticFetcher,
    SteamWorkshopFetcher,
};
pub use ini::{IniError, extract_workshop_ids, read_server_ini};
pub use layout::DataLayout;
pub use ledger::{FileLedger, LedgerError, LedgerStore, MemoryLedger};
pub use record::{ModRecord, ModStatus, RawItem};
pub use selection::{DemoteAllOutcome, SelectionState, TransferError};
