//! Command handler functions for the covstore CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;

use crate::ingest::{self, Target};
use crate::model::{Report, ReportComment, ReportQuery};
use crate::store::ReportStore;

pub fn cmd_upload(
    store: &mut ReportStore,
    target: &Target<'_>,
    file: &Path,
    report_type: Option<&str>,
    files: Option<&Path>,
) -> Result<String> {
    let report = ingest::ingest(store, target, file, report_type, files)?;
    let kinds: Vec<&str> = report.coverages.iter().map(|c| c.kind.as_str()).collect();
    Ok(format!(
        "Uploaded {} → report '{}' at commit {} (types: {})\n",
        file.display(),
        report.group_id,
        short_sha(&report.commit),
        kinds.join(", "),
    ))
}

pub fn cmd_show(store: &ReportStore, query: &ReportQuery) -> Result<String> {
    let report = store.find(query)?;
    Ok(format_report(&report))
}

pub fn cmd_history(store: &ReportStore, query: &ReportQuery) -> Result<String> {
    let reports = store.finds(query)?;
    Ok(format_table(&reports))
}

pub fn cmd_list(store: &ReportStore, group_id: &str, selector: &str) -> Result<String> {
    let reports = store.list(group_id, selector)?;
    let mut out = String::new();
    for report in &reports {
        out.push_str(&format_report(report));
        out.push('\n');
    }
    Ok(out)
}

pub fn cmd_comment(
    store: &mut ReportStore,
    group_id: &str,
    number: i64,
    comment: i64,
) -> Result<String> {
    let report = Report::new(group_id, "");
    store.create_comment(&report, &ReportComment { number, comment })?;
    Ok(format!(
        "Recorded comment {} for pull request #{} of '{}'\n",
        comment, number, group_id
    ))
}

pub fn cmd_show_comment(store: &ReportStore, group_id: &str, number: i64) -> Result<String> {
    let comment = store.find_comment(&Report::new(group_id, ""), number)?;
    Ok(format!("#{}: {}\n", comment.number, comment.comment))
}

/// CI variables consulted, in order, when no branch is passed explicitly.
pub const BRANCH_ENV_VARS: [&str; 2] = ["GITHUB_HEAD_REF", "DRONE_SOURCE_BRANCH"];

/// The branch to attach an upload to: the explicit flag if non-empty,
/// otherwise the first non-empty CI variable from [`BRANCH_ENV_VARS`].
pub fn resolve_branch(
    flag: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    flag.filter(|b| !b.is_empty()).or_else(|| {
        BRANCH_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|b| !b.is_empty())
    })
}

fn short_sha(sha: &str) -> &str {
    sha.char_indices().nth(7).map_or(sha, |(i, _)| &sha[..i])
}

fn format_report(report: &Report) -> String {
    let mut out = String::new();
    writeln!(out, "Report:     {}", report.group_id).unwrap();
    writeln!(out, "Commit:     {}", report.commit).unwrap();
    if !report.reference.is_empty() {
        writeln!(out, "Reference:  {}", report.reference).unwrap();
    }
    writeln!(out, "Created:    {}", report.created_at).unwrap();
    writeln!(out, "Files:      {}", report.files.len()).unwrap();
    for coverage in &report.coverages {
        writeln!(
            out,
            "  {:<10} {:>7.1}%  ({} files)",
            coverage.kind.as_str(),
            coverage.statement_coverage * 100.0,
            coverage.files.len()
        )
        .unwrap();
    }
    out
}

fn format_table(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "No matching reports.\n".to_string();
    }
    let mut out = String::new();
    writeln!(out, "{:<12} {:<20} {:<16} CREATED", "COMMIT", "REFERENCE", "TYPES").unwrap();
    writeln!(out, "{}", "-".repeat(80)).unwrap();
    for report in reports {
        let kinds: Vec<&str> = report.coverages.iter().map(|c| c.kind.as_str()).collect();
        writeln!(
            out,
            "{:<12} {:<20} {:<16} {}",
            short_sha(&report.commit),
            report.reference,
            kinds.join(","),
            report.created_at
        )
        .unwrap();
    }
    out
}
