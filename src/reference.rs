//! Named pointers (branches, tags) and the history of reports uploaded under
//! each. A reference is unique per `(group_id, name)` and only ever grows.

use rusqlite::{Connection, Transaction};

use crate::db;
use crate::error::{Result, StoreError};

/// Associate `report_id` with reference `name` of `group_id`, creating the
/// reference on first use. Re-attaching an already associated report is a
/// no-op, so retries never add rows.
pub fn attach(tx: &Transaction, group_id: &str, name: &str, report_id: i64) -> Result<()> {
    let reference_id = match db::find_reference_id(tx, group_id, name)? {
        Some(id) => id,
        None => {
            tracing::debug!(group = %group_id, reference = %name, "creating reference");
            db::insert_reference(tx, group_id, name)?
        }
    };

    if db::is_associated(tx, reference_id, report_id)? {
        tracing::debug!(group = %group_id, reference = %name, "report already attached");
        return Ok(());
    }
    // The unique index backs up the check above if two writers ever race.
    db::associate(tx, reference_id, report_id)?;
    Ok(())
}

fn resolve(conn: &Connection, group_id: &str, name: &str) -> Result<i64> {
    if group_id.is_empty() {
        return Err(StoreError::NotFound(format!(
            "reference '{}' without a report group",
            name
        )));
    }
    db::find_reference_id(conn, group_id, name)?.ok_or_else(|| {
        StoreError::NotFound(format!("reference '{}' in group '{}'", name, group_id))
    })
}

/// The report most recently attached to the reference.
pub fn latest_report_id(conn: &Connection, group_id: &str, name: &str) -> Result<i64> {
    let reference_id = resolve(conn, group_id, name)?;
    db::last_associated_report_id(conn, reference_id)?.ok_or_else(|| {
        StoreError::NotFound(format!("reports on reference '{}' in group '{}'", name, group_id))
    })
}

/// Every report attached to the reference, oldest association first.
pub fn history(conn: &Connection, group_id: &str, name: &str) -> Result<Vec<i64>> {
    let reference_id = resolve(conn, group_id, name)?;
    db::associated_report_ids(conn, reference_id)
}
