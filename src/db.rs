//! Row-level access to the report tables. Nothing here decides how reports
//! merge; write helpers take a `Transaction` so they can only run inside the
//! caller's unit of work.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{CoverageReport, File, Report, ReportComment, ReportType};

pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = include_str!("../schema.sql");

/// Open (or create) the database described by `config`.
pub fn open(config: &StoreConfig) -> Result<Connection> {
    let conn = Connection::open(&config.path)?;
    configure(&conn, config)?;
    Ok(conn)
}

/// Open a private in-memory database. Mostly useful for tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn, &StoreConfig::new(":memory:"))?;
    Ok(conn)
}

fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.busy_timeout(config.busy_timeout)?;
    // journal_mode returns a row, so it can't go through execute_batch on
    // every SQLite build.
    let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
    Ok(())
}

/// Ensure the schema is initialized. Safe to call on an already-initialized DB.
/// Any on-disk version other than `SCHEMA_VERSION` is rejected.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    match version {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
        }
        Some(v) if v == SCHEMA_VERSION => {}
        Some(v) if v > SCHEMA_VERSION => {
            return Err(StoreError::Other(format!(
                "Database schema version {} is newer than this binary supports ({}). \
                 Please upgrade covstore.",
                v, SCHEMA_VERSION
            )));
        }
        Some(v) => {
            return Err(StoreError::Other(format!(
                "Unsupported database schema version {} (expected {}).",
                v, SCHEMA_VERSION
            )));
        }
    }
    Ok(())
}

/// Fixed-width UTC timestamp, so text ordering matches time ordering.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ── Reports ────────────────────────────────────────────────────────────────

pub fn find_report_id(conn: &Connection, group_id: &str, commit: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM report WHERE group_id = ?1 AND commit_sha = ?2",
            params![group_id, commit],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Most recently created report of a group. Ties on `created_at` fall back to
/// insertion order.
pub fn latest_report_id(conn: &Connection, group_id: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM report WHERE group_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
            params![group_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Every report of a group, oldest first.
pub fn report_ids(conn: &Connection, group_id: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM report WHERE group_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![group_id], |row| row.get(0))?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub fn insert_report(tx: &Transaction, report: &Report, created_at: &str) -> Result<i64> {
    let files = serde_json::to_string(&report.files)?;
    tx.execute(
        "INSERT INTO report (group_id, commit_sha, reference, files, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![report.group_id, report.commit, report.reference, files, created_at],
    )?;
    Ok(tx.last_insert_rowid())
}

pub fn update_report_reference(tx: &Transaction, report_id: i64, reference: &str) -> Result<()> {
    tx.execute(
        "UPDATE report SET reference = ?1 WHERE id = ?2",
        params![reference, report_id],
    )?;
    Ok(())
}

pub fn update_report_files(tx: &Transaction, report_id: i64, files: &[String]) -> Result<()> {
    let files = serde_json::to_string(files)?;
    tx.execute(
        "UPDATE report SET files = ?1 WHERE id = ?2",
        params![files, report_id],
    )?;
    Ok(())
}

/// Load a report together with its coverage reports and files.
pub fn load_report(conn: &Connection, report_id: i64) -> Result<Report> {
    let (group_id, commit, reference, files, created_at): (String, String, String, String, String) =
        conn.query_row(
            "SELECT group_id, commit_sha, reference, files, created_at FROM report WHERE id = ?1",
            params![report_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("report id {}", report_id)))?;

    Ok(Report {
        group_id,
        commit,
        reference,
        files: serde_json::from_str(&files)?,
        created_at,
        coverages: load_coverages(conn, report_id)?,
    })
}

pub fn load_reports(conn: &Connection, report_ids: &[i64]) -> Result<Vec<Report>> {
    report_ids.iter().map(|&id| load_report(conn, id)).collect()
}

// ── Coverage reports ───────────────────────────────────────────────────────

pub fn find_coverage_report_id(
    conn: &Connection,
    report_id: i64,
    kind: ReportType,
) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM coverage_report WHERE report_id = ?1 AND type = ?2",
            params![report_id, kind.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn insert_coverage_report(
    tx: &Transaction,
    report_id: i64,
    coverage: &CoverageReport,
) -> Result<i64> {
    tx.execute(
        "INSERT INTO coverage_report (report_id, type, ratio) VALUES (?1, ?2, ?3)",
        params![report_id, coverage.kind.as_str(), coverage.statement_coverage],
    )?;
    let id = tx.last_insert_rowid();
    insert_files(tx, id, &coverage.files)?;
    Ok(id)
}

/// Overwrite ratio and files of an existing coverage report, keeping its id.
pub fn replace_coverage_report(
    tx: &Transaction,
    coverage_report_id: i64,
    coverage: &CoverageReport,
) -> Result<()> {
    tx.execute(
        "UPDATE coverage_report SET ratio = ?1 WHERE id = ?2",
        params![coverage.statement_coverage, coverage_report_id],
    )?;
    tx.execute(
        "DELETE FROM file WHERE coverage_report_id = ?1",
        params![coverage_report_id],
    )?;
    insert_files(tx, coverage_report_id, &coverage.files)
}

fn insert_files(tx: &Transaction, coverage_report_id: i64, files: &[File]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO file (coverage_report_id, name, ratio) VALUES (?1, ?2, ?3)",
    )?;
    for file in files {
        stmt.execute(params![coverage_report_id, file.name, file.statement_coverage])?;
    }
    Ok(())
}

fn load_coverages(conn: &Connection, report_id: i64) -> Result<Vec<CoverageReport>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, type, ratio FROM coverage_report WHERE report_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![report_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut result = Vec::new();
    for row in rows {
        let (id, kind, ratio) = row?;
        result.push(CoverageReport {
            kind: kind.parse()?,
            statement_coverage: ratio,
            files: load_files(conn, id)?,
        });
    }
    Ok(result)
}

fn load_files(conn: &Connection, coverage_report_id: i64) -> Result<Vec<File>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, ratio FROM file WHERE coverage_report_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![coverage_report_id], |row| {
        Ok(File {
            name: row.get(0)?,
            statement_coverage: row.get(1)?,
        })
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

// ── References ─────────────────────────────────────────────────────────────

pub fn find_reference_id(conn: &Connection, group_id: &str, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM reference WHERE group_id = ?1 AND name = ?2",
            params![group_id, name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn insert_reference(tx: &Transaction, group_id: &str, name: &str) -> Result<i64> {
    tx.execute(
        "INSERT INTO reference (group_id, name) VALUES (?1, ?2)",
        params![group_id, name],
    )?;
    Ok(tx.last_insert_rowid())
}

pub fn is_associated(conn: &Connection, reference_id: i64, report_id: i64) -> Result<bool> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM reference_report WHERE reference_id = ?1 AND report_id = ?2",
        params![reference_id, report_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Append an association. The unique constraint turns a duplicate into a
/// no-op; returns whether a row was written.
pub fn associate(tx: &Transaction, reference_id: i64, report_id: i64) -> Result<bool> {
    let changed = tx.execute(
        "INSERT OR IGNORE INTO reference_report (reference_id, report_id) VALUES (?1, ?2)",
        params![reference_id, report_id],
    )?;
    Ok(changed > 0)
}

/// Report ids associated with a reference, in association order.
pub fn associated_report_ids(conn: &Connection, reference_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT report_id FROM reference_report WHERE reference_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![reference_id], |row| row.get(0))?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub fn last_associated_report_id(conn: &Connection, reference_id: i64) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT report_id FROM reference_report WHERE reference_id = ?1 ORDER BY id DESC LIMIT 1",
            params![reference_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

// ── Comments ───────────────────────────────────────────────────────────────

pub fn upsert_comment(tx: &Transaction, group_id: &str, comment: &ReportComment) -> Result<()> {
    tx.execute(
        "INSERT INTO report_comment (group_id, number, value) VALUES (?1, ?2, ?3) \
         ON CONFLICT(group_id, number) DO UPDATE SET value = excluded.value",
        params![group_id, comment.number, comment.comment],
    )?;
    Ok(())
}

pub fn find_comment(conn: &Connection, group_id: &str, number: i64) -> Result<Option<ReportComment>> {
    let comment = conn
        .query_row(
            "SELECT number, value FROM report_comment WHERE group_id = ?1 AND number = ?2",
            params![group_id, number],
            |row| {
                Ok(ReportComment {
                    number: row.get(0)?,
                    comment: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_schema_is_idempotent() {
        let conn = open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let version: u32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let conn = open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "UPDATE schema_version SET version = ?1",
            params![SCHEMA_VERSION + 1],
        )
        .unwrap();
        let err = init_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer"), "got: {err}");
    }

    #[test]
    fn older_schema_version_is_rejected() {
        let conn = open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute("UPDATE schema_version SET version = 0", []).unwrap();
        let err = init_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("Unsupported"), "got: {err}");
    }

    #[test]
    fn timestamps_sort_as_text() {
        let a = now();
        let b = now();
        assert_eq!(a.len(), b.len());
        assert!(a <= b);
    }
}
