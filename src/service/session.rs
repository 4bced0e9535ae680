//! The database seam: a connection source plus a per-request session.

use crate::config::TableDescriptor;
use crate::error::AppError;
use crate::sql::BindValue;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// One result row, every value rendered as a string (NULL as "").
pub type Row = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// A single connection held for one request or pipeline invocation.
///
/// Dropping the session releases it; an open transaction is rolled back on release.
#[async_trait]
pub trait Session: Send {
    async fn exec(&mut self, sql: &str, binds: &[BindValue]) -> Result<ExecOutcome, AppError>;

    async fn query(&mut self, sql: &str, binds: &[BindValue]) -> Result<Vec<Row>, AppError>;

    async fn begin(&mut self) -> Result<(), AppError>;

    async fn commit(&mut self) -> Result<(), AppError>;

    async fn rollback(&mut self) -> Result<(), AppError>;
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn session(&self) -> Result<Box<dyn Session>, AppError>;

    /// Introspect the current schema: tables with ordered columns and primary keys.
    async fn tables(&self) -> Result<Vec<TableDescriptor>, AppError>;
}
