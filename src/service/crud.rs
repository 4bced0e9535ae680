//! Generated per-table CRUD and the free-form query: one session, one shorthand statement, no pipeline.

use crate::config::{SqlConf, StatementType, TableDescriptor};
use crate::error::AppError;
use crate::service::resolver::LocalScope;
use crate::service::session::{Database, Row};
use crate::service::statement::{StatementExecutor, StatementOutcome};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    async fn run(
        db: &dyn Database,
        tables: &HashMap<String, TableDescriptor>,
        table: &TableDescriptor,
        ty: StatementType,
        params: &Map<String, Value>,
    ) -> Result<StatementOutcome, AppError> {
        let conf = SqlConf::shorthand(&table.name, ty);
        let mut session = db.session().await?;
        StatementExecutor::new(tables)
            .execute(session.as_mut(), &conf, params, &LocalScope::new())
            .await
    }

    /// Insert one row from the body's keys. Returns the generated id.
    pub async fn insert(
        db: &dyn Database,
        tables: &HashMap<String, TableDescriptor>,
        table: &TableDescriptor,
        params: &Map<String, Value>,
    ) -> Result<u64, AppError> {
        match Self::run(db, tables, table, StatementType::Insert, params).await? {
            StatementOutcome::Written { last_insert_id, .. } => Ok(last_insert_id.unwrap_or_default()),
            other => Err(unexpected(other)),
        }
    }

    /// Update by `id` against the first primary key. Returns affected rows.
    pub async fn update(
        db: &dyn Database,
        tables: &HashMap<String, TableDescriptor>,
        table: &TableDescriptor,
        params: &Map<String, Value>,
    ) -> Result<u64, AppError> {
        match Self::run(db, tables, table, StatementType::Update, params).await? {
            StatementOutcome::Written { rows_affected, .. } => Ok(rows_affected),
            other => Err(unexpected(other)),
        }
    }

    pub async fn select(
        db: &dyn Database,
        tables: &HashMap<String, TableDescriptor>,
        table: &TableDescriptor,
        params: &Map<String, Value>,
    ) -> Result<Vec<Row>, AppError> {
        match Self::run(db, tables, table, StatementType::Select, params).await? {
            StatementOutcome::Rows(rows) => Ok(rows),
            other => Err(unexpected(other)),
        }
    }

    /// Delete by `id`. Fails before touching the database if the table has no primary key.
    pub async fn delete(
        db: &dyn Database,
        tables: &HashMap<String, TableDescriptor>,
        table: &TableDescriptor,
        params: &Map<String, Value>,
    ) -> Result<u64, AppError> {
        if params.get("id").map_or(true, Value::is_null) {
            return Err(AppError::input("id is required to delete data"));
        }
        if table.primary_keys.is_empty() {
            return Err(AppError::input("table has no primary key, cannot delete"));
        }
        match Self::run(db, tables, table, StatementType::Delete, params).await? {
            StatementOutcome::Written { rows_affected, .. } => Ok(rows_affected),
            other => Err(unexpected(other)),
        }
    }

    pub async fn count(
        db: &dyn Database,
        tables: &HashMap<String, TableDescriptor>,
        table: &TableDescriptor,
        params: &Map<String, Value>,
    ) -> Result<i64, AppError> {
        match Self::run(db, tables, table, StatementType::Count, params).await? {
            StatementOutcome::Count(n) => Ok(n),
            other => Err(unexpected(other)),
        }
    }

    /// Free-form read query with no binds.
    pub async fn query(db: &dyn Database, sql: &str) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %sql, "free-form query");
        let mut session = db.session().await?;
        session.query(sql, &[]).await
    }
}

fn unexpected(outcome: StatementOutcome) -> AppError {
    AppError::Db(sqlx::Error::Protocol(format!("unexpected statement outcome: {:?}", outcome)))
}
