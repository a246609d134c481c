//! Cache repair: evict orphans, detect gaps, re-fetch what is missing.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};

use super::report::{RepairReport, RepairStage};
use crate::cache::ArtifactCache;
use crate::fetcher::Fetcher;
use crate::record::ModRecord;

/// Brings `cache` in line with `ledger`.
///
/// Each step works per id; a failure is logged, recorded in the report and
/// the pass moves on. Metadata is written before the image so an interrupted
/// item leaves a detectable image gap.
#[tracing::instrument(skip_all, fields(ledger_size = ledger.len()))]
pub(crate) async fn repair_cache(
    cache: &dyn ArtifactCache,
    fetcher: &dyn Fetcher,
    ledger: &BTreeSet<String>,
) -> RepairReport {
    let mut report = RepairReport::default();

    evict_orphans(cache, ledger, &mut report).await;

    let (missing_metadata, missing_images) = detect_gaps(cache, ledger, &mut report).await;
    report.missing_metadata = missing_metadata.iter().cloned().collect();
    report.missing_images = missing_images.iter().cloned().collect();

    let missing: BTreeSet<String> = missing_metadata.union(&missing_images).cloned().collect();
    if missing.is_empty() {
        debug!("cache matches ledger, nothing to repair");
        return report;
    }
    info!(
        missing_metadata = ?report.missing_metadata,
        missing_images = ?report.missing_images,
        "cache gaps detected"
    );

    report.requested = missing.iter().cloned().collect();
    let items = fetcher.fetch_by_ids(&report.requested).await;

    let mut returned = BTreeSet::new();
    for item in items {
        if !missing.contains(&item.id) || !returned.insert(item.id.clone()) {
            debug!(id = %item.id, "ignoring unrequested fetch result");
            continue;
        }

        // Cached metadata is kept as is; an image-only gap only needs the URL.
        if missing_metadata.contains(&item.id) {
            let record = ModRecord::from_raw(item.clone());
            match cache.write_metadata(&record).await {
                Ok(()) => report.metadata_written.push(item.id.clone()),
                Err(e) => {
                    error!(id = %item.id, error = %e, "failed to write metadata");
                    report.fail(&item.id, RepairStage::WriteMetadata, e);
                }
            }
        }

        if !missing_images.contains(&item.id) {
            continue;
        }
        let bytes = match fetcher.download_image(&item).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(id = %item.id, error = %e, "failed to download preview image");
                report.fail(&item.id, RepairStage::DownloadImage, e);
                continue;
            }
        };
        match cache.write_image(&item.id, &bytes).await {
            Ok(()) => report.images_written.push(item.id.clone()),
            Err(e) => {
                error!(id = %item.id, error = %e, "failed to write image");
                report.fail(&item.id, RepairStage::WriteImage, e);
            }
        }
    }

    for id in missing.difference(&returned) {
        warn!(id = %id, "fetcher returned nothing for missing id");
        report.fail(id.as_str(), RepairStage::Fetch, "no data returned by fetcher");
    }

    info!(
        metadata_written = report.metadata_written.len(),
        images_written = report.images_written.len(),
        failures = report.failures.len(),
        "cache repair finished"
    );
    report
}

async fn evict_orphans(
    cache: &dyn ArtifactCache,
    ledger: &BTreeSet<String>,
    report: &mut RepairReport,
) {
    match cache.list_metadata_ids().await {
        Ok(ids) => {
            for id in ids.difference(ledger) {
                match cache.delete_metadata(id).await {
                    Ok(true) => {
                        info!(id = %id, "evicted orphaned metadata");
                        report.evicted_metadata.push(id.clone());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(id = %id, error = %e, "failed to evict metadata");
                        report.fail(id.as_str(), RepairStage::Evict, e);
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "failed to list cached metadata");
            report.fail("", RepairStage::List, e);
        }
    }

    match cache.list_image_ids().await {
        Ok(ids) => {
            for id in ids.difference(ledger) {
                match cache.delete_image(id).await {
                    Ok(true) => {
                        info!(id = %id, "evicted orphaned image");
                        report.evicted_images.push(id.clone());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(id = %id, error = %e, "failed to evict image");
                        report.fail(id.as_str(), RepairStage::Evict, e);
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "failed to list cached images");
            report.fail("", RepairStage::List, e);
        }
    }
}

/// Ledger ids without metadata and without an image. A failed probe counts as a gap.
async fn detect_gaps(
    cache: &dyn ArtifactCache,
    ledger: &BTreeSet<String>,
    report: &mut RepairReport,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut missing_metadata = BTreeSet::new();
    let mut missing_images = BTreeSet::new();

    for id in ledger {
        match cache.has_metadata(id).await {
            Ok(true) => {}
            Ok(false) => {
                missing_metadata.insert(id.clone());
            }
            Err(e) => {
                warn!(id = %id, error = %e, "failed to probe metadata");
                report.fail(id.as_str(), RepairStage::Probe, e);
                missing_metadata.insert(id.clone());
            }
        }
        match cache.has_image(id).await {
            Ok(true) => {}
            Ok(false) => {
                missing_images.insert(id.clone());
            }
            Err(e) => {
                warn!(id = %id, error = %e, "failed to probe image");
                report.fail(id.as_str(), RepairStage::Probe, e);
                missing_images.insert(id.clone());
            }
        }
    }

    (missing_metadata, missing_images)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::fetcher::StaticFetcher;
    use crate::record::RawItem;

    fn ledger(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    async fn seed(cache: &MemoryCache, id: &str) {
        cache
            .write_metadata(&ModRecord::from_raw(RawItem::placeholder(id)))
            .await
            .unwrap();
        cache.write_image(id, b"img").await.unwrap();
    }

    #[tokio::test]
    async fn test_clean_cache_requests_nothing() {
        let cache = MemoryCache::new();
        seed(&cache, "1").await;
        let fetcher = StaticFetcher::new();

        let report = repair_cache(&cache, &fetcher, &ledger(&["1"])).await;

        assert_eq!(report, RepairReport::default());
        assert!(fetcher.requested_ids().is_empty());
    }

    #[tokio::test]
    async fn test_image_only_gap_keeps_cached_metadata() {
        let cache = MemoryCache::new();
        let mut cached = RawItem::placeholder("2");
        cached.title = "Brita's Weapon Pack".into();
        cache.write_metadata(&ModRecord::from_raw(cached)).await.unwrap();
        let fetcher = StaticFetcher::new()
            .with_item(RawItem::placeholder("2"))
            .with_image("2", b"png".to_vec());

        let report = repair_cache(&cache, &fetcher, &ledger(&["2"])).await;

        assert!(report.missing_metadata.is_empty());
        assert_eq!(report.missing_images, vec!["2"]);
        assert!(report.metadata_written.is_empty());
        assert_eq!(report.images_written, vec!["2"]);
        assert_eq!(cache.read_metadata("2").await.unwrap().title, "Brita's Weapon Pack");
        assert_eq!(cache.image("2").unwrap(), b"png");
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_metadata_gap_does_not_redownload_present_image() {
        let cache = MemoryCache::new();
        cache.write_image("3", b"old").await.unwrap();
        let fetcher = StaticFetcher::new()
            .with_item(RawItem::placeholder("3"))
            .with_image("3", b"new".to_vec());

        let report = repair_cache(&cache, &fetcher, &ledger(&["3"])).await;

        assert_eq!(report.metadata_written, vec!["3"]);
        assert!(report.images_written.is_empty());
        assert_eq!(cache.image("3").unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_failures_are_recorded_per_id() {
        let cache = MemoryCache::new();
        cache.fail_metadata_writes_for("5");
        let fetcher = StaticFetcher::new()
            .with_item(RawItem::placeholder("5"))
            .with_image("5", b"png".to_vec())
            .with_item(RawItem::placeholder("6"));

        let report = repair_cache(&cache, &fetcher, &ledger(&["5", "6", "7"])).await;

        let stages: Vec<_> = report
            .failures
            .iter()
            .map(|f| (f.id.as_str(), f.stage))
            .collect();
        assert_eq!(
            stages,
            vec![
                ("5", RepairStage::WriteMetadata),
                ("6", RepairStage::DownloadImage),
                ("7", RepairStage::Fetch),
            ]
        );
        assert_eq!(report.images_written, vec!["5"]);
        assert_eq!(report.metadata_written, vec!["6"]);
    }
}
