use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field is missing or invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No matching report, reference or comment.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage-layer failure, including lock conflicts and interrupts.
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// True for a transient lock conflict. Only these are worth retrying:
    /// the merge and reference attach are idempotent, so a second attempt
    /// with the same input is safe.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            StoreError::Persistence(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
