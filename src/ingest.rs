use std::path::Path;

use crate::error::Result;
use crate::model::{CoverageReport, Report, ReportQuery, ReportType};
use crate::store::ReportStore;

/// Where an upload is going.
#[derive(Debug, Clone, Default)]
pub struct Target<'a> {
    pub group_id: &'a str,
    pub commit: &'a str,
    pub reference: Option<&'a str>,
}

/// Read an already-parsed coverage payload (JSON) and optional file listing
/// (JSON array of paths) from disk, then upload them to `target`.
/// Returns the report as stored after the merge.
pub fn ingest(
    store: &mut ReportStore,
    target: &Target<'_>,
    coverage_path: &Path,
    type_override: Option<&str>,
    files_path: Option<&Path>,
) -> Result<Report> {
    let content = std::fs::read(coverage_path)?;
    let mut coverage: CoverageReport = serde_json::from_slice(&content)?;
    if let Some(kind) = type_override {
        coverage.kind = kind.parse::<ReportType>()?;
    }

    let files = match files_path {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => Vec::new(),
    };

    let report = Report {
        group_id: target.group_id.to_string(),
        commit: target.commit.to_string(),
        reference: target.reference.unwrap_or_default().to_string(),
        files,
        created_at: String::new(),
        coverages: vec![coverage],
    };

    upload_with_retry(store, &report)?;
    store.find(&ReportQuery::group(target.group_id).commit(target.commit))
}

/// Upload, retrying once if another writer held the lock past the busy
/// timeout.
pub fn upload_with_retry(store: &mut ReportStore, report: &Report) -> Result<()> {
    match store.upload(report) {
        Err(e) if e.is_conflict() => {
            tracing::warn!(error = %e, "upload conflicted, retrying once");
            store.upload(report)
        }
        other => other,
    }
}
