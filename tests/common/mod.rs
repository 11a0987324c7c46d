#![allow(dead_code)]

use std::path::PathBuf;

use covstore::config::StoreConfig;
use covstore::model::{CoverageReport, File, Report, ReportType};
use covstore::ReportStore;
use tempfile::TempDir;

/// Create a fresh temporary database, returning the store, dir handle, and db path.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn setup_store() -> (ReportStore, TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let store = ReportStore::open(&StoreConfig::new(&db_path)).unwrap();
    (store, dir, db_path)
}

pub fn coverage(kind: ReportType, ratio: f64, files: &[(&str, f64)]) -> CoverageReport {
    CoverageReport {
        kind,
        statement_coverage: ratio,
        files: files
            .iter()
            .map(|(name, ratio)| File {
                name: name.to_string(),
                statement_coverage: *ratio,
            })
            .collect(),
    }
}

pub fn report(group: &str, commit: &str, kinds: &[ReportType]) -> Report {
    let mut report = Report::new(group, commit);
    for &kind in kinds {
        report.coverages.push(CoverageReport::new(kind));
    }
    report
}

pub fn kinds(report: &Report) -> Vec<ReportType> {
    let mut kinds: Vec<ReportType> = report.coverages.iter().map(|c| c.kind).collect();
    kinds.sort();
    kinds
}

pub fn commits(reports: &[Report]) -> Vec<&str> {
    reports.iter().map(|r| r.commit.as_str()).collect()
}

pub fn count_rows(store: &ReportStore, sql: &str) -> u64 {
    store
        .connection()
        .query_row(sql, [], |row| row.get(0))
        .unwrap()
}
