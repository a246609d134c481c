//! Terminal rendering of pools, reports and the library view.

use workshop_curator::{
    ClassificationReport, CommitReport, LibraryEntry, ModRecord, ModStatus, Notice, RepairReport,
    SelectionState,
};

/// Label shown next to a record; the CLI's stand-in for the pool colors.
pub(crate) fn status_label(status: ModStatus) -> &'static str {
    match status {
        ModStatus::New => "[new]",
        ModStatus::Committed => "[committed]",
        ModStatus::Conflict => "[conflict]",
    }
}

pub(crate) fn format_record_line(record: &ModRecord) -> String {
    format!(
        "  {:<12} {:<12} {} (by {})",
        status_label(record.status),
        record.id,
        record.title,
        record.author
    )
}

pub(crate) fn print_classification(report: &ClassificationReport) {
    println!(
        "Scraped: {} new, {} committed, {} conflict(s), {} skipped",
        report.new, report.committed, report.conflicts, report.skipped
    );
    print_notices(&report.notices);
}

pub(crate) fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("Notice: {notice}");
    }
}

pub(crate) fn print_selection(selection: &SelectionState) {
    println!("Candidates ({}):", selection.candidates().len());
    for record in selection.candidates() {
        println!("{}", format_record_line(record));
    }
    println!("Held ({}):", selection.held().len());
    for record in selection.held() {
        println!("{}", format_record_line(record));
    }
}

pub(crate) fn print_commit_report(report: &CommitReport) {
    if report.added.is_empty() {
        println!("Library unchanged ({} mod(s))", report.ledger_size);
    } else {
        println!(
            "Added {} mod(s) to the library: {} ({} total)",
            report.added.len(),
            report.added.join(", "),
            report.ledger_size
        );
    }
    print_repair_report(&report.repair);
}

pub(crate) fn print_repair_report(report: &RepairReport) {
    let evicted = report.evicted_metadata.len() + report.evicted_images.len();
    if evicted > 0 {
        println!("Evicted {evicted} orphaned cache file(s)");
    }
    if !report.requested.is_empty() {
        println!(
            "Repaired cache: {} metadata, {} image(s) written for {} missing mod(s)",
            report.metadata_written.len(),
            report.images_written.len(),
            report.requested.len()
        );
    }
    for failure in &report.failures {
        println!(
            "  failed [{}] {}: {}",
            failure.stage, failure.id, failure.reason
        );
    }
}

pub(crate) fn print_library(entries: &[LibraryEntry]) {
    println!("Library ({} mod(s)):", entries.len());
    for entry in entries {
        let image = if entry.has_image { "" } else { " [no image]" };
        match &entry.record {
            Some(record) => println!(
                "  {:<12} {} (by {}){image}",
                entry.id, record.title, record.author
            ),
            None => println!("  {:<12} [no metadata]{image}", entry.id),
        }
    }
}
