//! Read paths. Reports come back fully merged; nothing here writes.

use crate::db;
use crate::error::{Result, StoreError};
use crate::model::{Report, ReportQuery};
use crate::reference;
use crate::store::ReportStore;

impl ReportStore {
    /// Single report matching `query`.
    ///
    /// - commit given: that exact commit, and if a reference is also given
    ///   the commit must be attached to it;
    /// - reference only: the report most recently attached to the reference;
    /// - neither: the most recently created report of the group.
    ///
    /// A query without a group id never matches.
    pub fn find(&self, query: &ReportQuery) -> Result<Report> {
        let conn = self.connection();
        let not_found = || StoreError::NotFound(format!("report for {}", query));
        if query.group_id.is_empty() {
            return Err(not_found());
        }

        let report_id = match (query.commit.is_empty(), query.reference.is_empty()) {
            (false, true) => db::find_report_id(conn, &query.group_id, &query.commit)?,
            (false, false) => {
                let id = db::find_report_id(conn, &query.group_id, &query.commit)?
                    .ok_or_else(not_found)?;
                let history = reference::history(conn, &query.group_id, &query.reference)?;
                history.contains(&id).then_some(id)
            }
            (true, false) => Some(reference::latest_report_id(
                conn,
                &query.group_id,
                &query.reference,
            )?),
            (true, true) => db::latest_report_id(conn, &query.group_id)?,
        };

        db::load_report(conn, report_id.ok_or_else(not_found)?)
    }

    /// Every report matching `query`, oldest first. An empty result is not an
    /// error, except that a query without a group id fails like [`find`].
    ///
    /// [`find`]: ReportStore::find
    pub fn finds(&self, query: &ReportQuery) -> Result<Vec<Report>> {
        let conn = self.connection();
        if query.group_id.is_empty() {
            return Err(StoreError::NotFound(format!("reports for {}", query)));
        }

        let ids = if query.reference.is_empty() {
            if query.commit.is_empty() {
                db::report_ids(conn, &query.group_id)?
            } else {
                db::find_report_id(conn, &query.group_id, &query.commit)?
                    .into_iter()
                    .collect()
            }
        } else {
            let history = match reference::history(conn, &query.group_id, &query.reference) {
                Ok(ids) => ids,
                Err(StoreError::NotFound(_)) => Vec::new(),
                Err(e) => return Err(e),
            };
            if query.commit.is_empty() {
                history
            } else {
                let wanted = db::find_report_id(conn, &query.group_id, &query.commit)?;
                history.into_iter().filter(|id| Some(*id) == wanted).collect()
            }
        };

        db::load_reports(conn, &ids)
    }

    /// Reports for `selector` within `group_id`. The selector is tried as a
    /// commit first and yields that one merged report; otherwise it names a
    /// reference and yields every report ever uploaded under it. An empty
    /// selector means the group's latest report.
    pub fn list(&self, group_id: &str, selector: &str) -> Result<Vec<Report>> {
        let conn = self.connection();
        if group_id.is_empty() {
            return Err(StoreError::NotFound(format!(
                "reports for '{}' without a report group",
                selector
            )));
        }
        if selector.is_empty() {
            return Ok(vec![self.find(&ReportQuery::group(group_id))?]);
        }

        let ids = match db::find_report_id(conn, group_id, selector)? {
            Some(id) => vec![id],
            None => reference::history(conn, group_id, selector)?,
        };
        db::load_reports(conn, &ids)
    }
}
