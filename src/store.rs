//! MySQL implementation of `Database`/`Session`, plus schema introspection from `information_schema`.

use crate::config::{ColumnDescriptor, DbSettings, TableDescriptor};
use crate::error::AppError;
use crate::service::{Database, ExecOutcome, Row, Session};
use crate::sql::BindValue;
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::{Column, Row as _, Transaction, ValueRef};
use std::collections::BTreeMap;

const COLUMNS_SQL: &str = r#"
    SELECT CAST(c.TABLE_NAME AS CHAR), CAST(c.COLUMN_NAME AS CHAR), CAST(c.COLUMN_TYPE AS CHAR),
           CAST(c.IS_NULLABLE AS CHAR), CAST(c.COLUMN_DEFAULT AS CHAR), CAST(c.COLUMN_KEY AS CHAR), CAST(c.EXTRA AS CHAR)
    FROM information_schema.COLUMNS c
    JOIN information_schema.TABLES t
      ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
    WHERE c.TABLE_SCHEMA = DATABASE() AND t.TABLE_TYPE = 'BASE TABLE'
    ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
"#;

const PRIMARY_KEYS_SQL: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR)
    FROM information_schema.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = DATABASE() AND CONSTRAINT_NAME = 'PRIMARY'
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

#[derive(Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    pub async fn connect(settings: &DbSettings) -> Result<Self, AppError> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(options)
            .await?;
        Ok(MySqlDatabase { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        MySqlDatabase { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn session(&self) -> Result<Box<dyn Session>, AppError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(MySqlSession {
            pool: self.pool.clone(),
            conn: Some(SessionConn::Idle(conn)),
        }))
    }

    async fn tables(&self) -> Result<Vec<TableDescriptor>, AppError> {
        type ColumnRow = (String, String, String, String, Option<String>, String, String);
        let columns: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL).fetch_all(&self.pool).await?;
        let pks: Vec<(String, String)> = sqlx::query_as(PRIMARY_KEYS_SQL).fetch_all(&self.pool).await?;

        let mut by_table: BTreeMap<String, TableDescriptor> = BTreeMap::new();
        for (table, name, sql_type, nullable, default, key, extra) in columns {
            by_table
                .entry(table.clone())
                .or_insert_with(|| TableDescriptor {
                    name: table,
                    columns: Vec::new(),
                    primary_keys: Vec::new(),
                })
                .columns
                .push(ColumnDescriptor {
                    name,
                    sql_type,
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                    default,
                    is_primary_key: false,
                    is_auto_increment: extra.to_lowercase().contains("auto_increment"),
                    key,
                    extra,
                });
        }
        for (table, column) in pks {
            if let Some(t) = by_table.get_mut(&table) {
                if let Some(c) = t.columns.iter_mut().find(|c| c.name == column) {
                    c.is_primary_key = true;
                }
                t.primary_keys.push(column);
            }
        }
        Ok(by_table.into_values().collect())
    }
}

enum SessionConn {
    Idle(PoolConnection<MySql>),
    Tx(Transaction<'static, MySql>),
}

/// A pooled connection, or an open transaction. A transaction dropped without commit rolls back
/// before its connection returns to the pool.
pub struct MySqlSession {
    pool: MySqlPool,
    conn: Option<SessionConn>,
}

impl MySqlSession {
    async fn conn(&mut self) -> Result<&mut MySqlConnection, AppError> {
        let conn = match self.conn.take() {
            Some(c) => c,
            None => SessionConn::Idle(self.pool.acquire().await?),
        };
        Ok(match self.conn.insert(conn) {
            SessionConn::Idle(c) => &mut **c,
            SessionConn::Tx(tx) => &mut **tx,
        })
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn exec(&mut self, sql: &str, binds: &[BindValue]) -> Result<ExecOutcome, AppError> {
        let conn = self.conn().await?;
        let mut query = sqlx::query(sql);
        for b in binds {
            query = query.bind(b.clone());
        }
        let done = query.execute(&mut *conn).await?;
        Ok(ExecOutcome {
            rows_affected: done.rows_affected(),
            last_insert_id: done.last_insert_id(),
        })
    }

    async fn query(&mut self, sql: &str, binds: &[BindValue]) -> Result<Vec<Row>, AppError> {
        let conn = self.conn().await?;
        let mut query = sqlx::query(sql);
        for b in binds {
            query = query.bind(b.clone());
        }
        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(row_to_strings).collect())
    }

    async fn begin(&mut self) -> Result<(), AppError> {
        if matches!(self.conn, Some(SessionConn::Tx(_))) {
            return Err(AppError::Db(sqlx::Error::Protocol("transaction already open".into())));
        }
        // Hand the idle connection back so the transaction can take one from the pool.
        self.conn = None;
        self.conn = Some(SessionConn::Tx(self.pool.begin().await?));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        match self.conn.take() {
            Some(SessionConn::Tx(tx)) => tx.commit().await?,
            other => self.conn = other,
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        match self.conn.take() {
            Some(SessionConn::Tx(tx)) => tx.rollback().await?,
            other => self.conn = other,
        }
        Ok(())
    }
}

fn row_to_strings(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), cell_to_string(row, col.ordinal())))
        .collect()
}

/// The driver's plain rendering of one cell; NULL becomes "".
fn cell_to_string(row: &MySqlRow, idx: usize) -> String {
    match row.try_get_raw(idx) {
        Ok(raw) if !raw.is_null() => {}
        _ => return String::new(),
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        return v.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(idx) {
        return v.format("%Y-%m-%d").to_string();
    }
    if let Ok(v) = row.try_get::<chrono::NaiveTime, _>(idx) {
        return v.format("%H:%M:%S").to_string();
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return v;
    }
    row.try_get_unchecked::<Vec<u8>, _>(idx)
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default()
}
