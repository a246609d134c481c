//! Classification of fetched items against the held pool and the ledger.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};

use super::report::{ClassificationReport, Notice};
use crate::record::{ModRecord, ModStatus, RawItem};
use crate::selection::SelectionState;

/// Rebuilds the candidate pool from `items` and corrects the held pool.
///
/// | held | in ledger | result                                |
/// |------|-----------|---------------------------------------|
/// | yes  | no        | held entry moved to the end, Conflict |
/// | yes  | yes       | untouched                             |
/// | no   | yes       | added to held as Committed            |
/// | no   | no        | added to candidates as New            |
pub(crate) fn classify(
    selection: &mut SelectionState,
    ledger: &BTreeSet<String>,
    items: Vec<RawItem>,
) -> ClassificationReport {
    let mut report = ClassificationReport::default();
    let mut seen = HashSet::new();
    let mut conflicts = Vec::new();

    selection.clear_candidates();

    for item in items {
        if item.id.is_empty() || !seen.insert(item.id.clone()) {
            debug!(id = %item.id, "skipping empty or repeated id");
            report.skipped += 1;
            continue;
        }

        let in_ledger = ledger.contains(&item.id);
        let in_held = selection.is_held(&item.id);
        let record = ModRecord::from_raw(item);

        match (in_held, in_ledger) {
            (true, false) => {
                conflicts.push(record.id.clone());
                selection.requeue_held(record.with_status(ModStatus::Conflict));
                report.conflicts += 1;
            }
            (true, true) => {
                report.committed += 1;
            }
            (false, true) => {
                selection.add_held(record.with_status(ModStatus::Committed));
                report.committed += 1;
            }
            (false, false) => {
                selection.add_candidate(record.with_status(ModStatus::New));
                report.new += 1;
            }
        }
    }

    if !conflicts.is_empty() {
        warn!(ids = ?conflicts, "held mods missing from ledger marked as conflicts");
        report.notices.push(Notice::ConflictsDetected { ids: conflicts });
    }

    info!(
        new = report.new,
        committed = report.committed,
        conflicts = report.conflicts,
        skipped = report.skipped,
        "classification finished"
    );
    report
}
