//! Reconciles an incoming upload with the report already stored for the same
//! `(group_id, commit)`.
//!
//! Coverage reports merge per type: an incoming type that is already stored
//! replaces the stored ratio and files wholesale, any other type is appended.
//! Types never merge line by line. The whole read-merge-write runs in one
//! immediate transaction together with the reference attach, so either the
//! merged report and its reference association both land or neither does.

use rusqlite::Transaction;

use crate::db;
use crate::error::{Result, StoreError};
use crate::model::{CoverageReport, Report};
use crate::reference;
use crate::store::ReportStore;

impl ReportStore {
    /// Store `report`, merging into any report already stored for its
    /// `(group_id, commit)`, and attach it to `report.reference` if one is
    /// given.
    pub fn upload(&mut self, report: &Report) -> Result<()> {
        validate(report)?;

        let tx = self.write_tx()?;
        let report_id = merge_tx(&tx, report)?;
        if !report.reference.is_empty() {
            reference::attach(&tx, &report.group_id, &report.reference, report_id)?;
        }
        tx.commit()?;

        tracing::info!(
            group = %report.group_id,
            commit = %report.commit,
            reference = %report.reference,
            "upload stored"
        );
        Ok(())
    }
}

fn validate(report: &Report) -> Result<()> {
    if report.group_id.is_empty() {
        return Err(StoreError::Validation("report group id is required".into()));
    }
    if report.commit.is_empty() {
        return Err(StoreError::Validation("commit is required".into()));
    }
    Ok(())
}

/// Write the merged report and return its row id.
fn merge_tx(tx: &Transaction, report: &Report) -> Result<i64> {
    let incoming = collapse_types(&report.coverages);

    let Some(report_id) = db::find_report_id(tx, &report.group_id, &report.commit)? else {
        tracing::debug!(group = %report.group_id, commit = %report.commit, "creating report");
        let report_id = db::insert_report(tx, report, &db::now())?;
        for coverage in incoming {
            db::insert_coverage_report(tx, report_id, coverage)?;
        }
        return Ok(report_id);
    };

    tracing::debug!(group = %report.group_id, commit = %report.commit, "merging into existing report");
    if !report.reference.is_empty() {
        db::update_report_reference(tx, report_id, &report.reference)?;
    }
    if !report.files.is_empty() {
        db::update_report_files(tx, report_id, &report.files)?;
    }
    for coverage in incoming {
        match db::find_coverage_report_id(tx, report_id, coverage.kind)? {
            Some(coverage_id) => {
                tracing::debug!(kind = %coverage.kind, "replacing coverage");
                db::replace_coverage_report(tx, coverage_id, coverage)?;
            }
            None => {
                tracing::debug!(kind = %coverage.kind, "appending coverage");
                db::insert_coverage_report(tx, report_id, coverage)?;
            }
        }
    }
    Ok(report_id)
}

/// One entry per type, keeping the last occurrence of each at the position
/// of the type's first occurrence.
fn collapse_types(coverages: &[CoverageReport]) -> Vec<&CoverageReport> {
    let mut result: Vec<&CoverageReport> = Vec::with_capacity(coverages.len());
    for coverage in coverages {
        match result.iter_mut().find(|c| c.kind == coverage.kind) {
            Some(slot) => *slot = coverage,
            None => result.push(coverage),
        }
    }
    result
}
