use crate::db;
use crate::error::{Result, StoreError};
use crate::model::{Report, ReportComment};
use crate::store::ReportStore;

impl ReportStore {
    /// Record the pull-request comment for `report`'s group, overwriting any
    /// comment already stored under the same PR number.
    pub fn create_comment(&mut self, report: &Report, comment: &ReportComment) -> Result<()> {
        if report.group_id.is_empty() {
            return Err(StoreError::Validation("report group id is required".into()));
        }
        if comment.number <= 0 {
            return Err(StoreError::Validation(
                "pull request number must be positive".into(),
            ));
        }
        if comment.comment == 0 {
            return Err(StoreError::Validation("comment id is required".into()));
        }

        let tx = self.write_tx()?;
        db::upsert_comment(&tx, &report.group_id, comment)?;
        tx.commit()?;
        tracing::debug!(group = %report.group_id, number = comment.number, "comment stored");
        Ok(())
    }

    pub fn find_comment(&self, report: &Report, number: i64) -> Result<ReportComment> {
        db::find_comment(self.connection(), &report.group_id, number)?.ok_or_else(|| {
            StoreError::NotFound(format!(
                "comment for pull request {} in group '{}'",
                number, report.group_id
            ))
        })
    }
}
