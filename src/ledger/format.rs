//! Text format of the ledger record: `WorkshopItems=<id1>;<id2>;...`.

use std::collections::BTreeSet;

/// Key that prefixes the id list.
pub const LEDGER_KEY: &str = "WorkshopItems=";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parses a ledger document into its id set.
///
/// Returns `None` when no line carries the `WorkshopItems=` key. A leading
/// byte-order mark, empty segments, surrounding whitespace and duplicates are
/// tolerated. When several lines carry the key their ids are unioned.
#[must_use]
pub fn parse_ledger(raw: &str) -> Option<BTreeSet<String>> {
    let mut found = false;
    let mut ids = BTreeSet::new();
    let raw = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw);
    for line in raw.lines() {
        let Some(list) = line.trim().strip_prefix(LEDGER_KEY) else {
            continue;
        };
        found = true;
        ids.extend(
            list.split(';')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToString::to_string),
        );
    }
    found.then_some(ids)
}

/// Formats an id set as a single ledger line (sorted, no trailing separator).
#[must_use]
pub fn format_ledger(ids: &BTreeSet<String>) -> String {
    let joined = ids
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(";");
    format!("{LEDGER_KEY}{joined}")
}
