use rusqlite::{Connection, InterruptHandle, Transaction, TransactionBehavior};

use crate::config::StoreConfig;
use crate::db;
use crate::error::Result;

/// Handle to the report database.
///
/// Each handle owns one connection. Share work across threads by opening one
/// handle per thread on the same path; SQLite's write lock then serializes
/// uploads while reads proceed concurrently under WAL.
pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Open the database described by `config` and make sure the schema exists.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = db::open(config)?;
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Interrupting aborts the statement in flight; the interrupted call
    /// returns a persistence error and its transaction rolls back.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Start a write transaction. `BEGIN IMMEDIATE` takes the write lock up
    /// front, so a read-merge-write sequence never works from a stale read.
    pub(crate) fn write_tx(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}
