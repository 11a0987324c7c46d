pub mod cli;
pub mod comment;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod query;
pub mod reference;
pub mod store;

pub use error::{Result, StoreError};
pub use store::ReportStore;
