//! A recording in-memory `Database` for driving executors and the router without MySQL.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dbrest::config::ColumnDescriptor;
use dbrest::service::{ExecOutcome, Row};
use dbrest::sql::BindValue;
use dbrest::{AppError, AppState, AuditLog, CatalogSource, Database, Session, TableDescriptor};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Exec,
    Query,
    Begin,
    Commit,
    Rollback,
}

#[derive(Clone, Debug)]
pub struct Call {
    pub kind: CallKind,
    pub sql: String,
    pub binds: Vec<BindValue>,
}

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    /// Writes that are visible: executed outside a transaction or committed.
    pub committed: Vec<String>,
    pending: Vec<String>,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub next_insert_id: u64,
    /// Any statement containing one of these substrings fails with a driver error.
    pub fail_on: Vec<String>,
    /// Queries containing the key, compared case-insensitively, return these rows.
    pub scripted: Vec<(String, Vec<Row>)>,
}

#[derive(Clone, Default)]
pub struct FakeDatabase {
    pub state: Arc<Mutex<FakeState>>,
    pub tables: Vec<TableDescriptor>,
}

impl FakeDatabase {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        let db = FakeDatabase {
            state: Arc::default(),
            tables,
        };
        db.state.lock().unwrap().next_insert_id = 1;
        db
    }

    pub fn fail_on(&self, needle: &str) {
        self.state.lock().unwrap().fail_on.push(needle.to_string());
    }

    pub fn script(&self, needle: &str, rows: Vec<Row>) {
        self.state.lock().unwrap().scripted.push((needle.to_string(), rows));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn committed(&self) -> Vec<String> {
        self.state.lock().unwrap().committed.clone()
    }

    pub fn sessions(&self) -> (usize, usize) {
        let st = self.state.lock().unwrap();
        (st.sessions_opened, st.sessions_closed)
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn session(&self) -> Result<Box<dyn Session>, AppError> {
        self.state.lock().unwrap().sessions_opened += 1;
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
            in_tx: false,
        }))
    }

    async fn tables(&self) -> Result<Vec<TableDescriptor>, AppError> {
        Ok(self.tables.clone())
    }
}

struct FakeSession {
    state: Arc<Mutex<FakeState>>,
    in_tx: bool,
}

impl FakeSession {
    fn record(&self, kind: CallKind, sql: &str, binds: &[BindValue]) -> Result<(), AppError> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(Call {
            kind,
            sql: sql.to_string(),
            binds: binds.to_vec(),
        });
        if st.fail_on.iter().any(|n| sql.contains(n.as_str())) {
            return Err(AppError::Db(sqlx::Error::Protocol(format!("forced failure: {}", sql))));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn exec(&mut self, sql: &str, binds: &[BindValue]) -> Result<ExecOutcome, AppError> {
        self.record(CallKind::Exec, sql, binds)?;
        let mut st = self.state.lock().unwrap();
        // Like MySQL, only inserts move the id; other writes report 0.
        let id = if sql.trim_start().to_uppercase().starts_with("INSERT") {
            st.next_insert_id += 1;
            st.next_insert_id - 1
        } else {
            0
        };
        if self.in_tx {
            st.pending.push(sql.to_string());
        } else {
            st.committed.push(sql.to_string());
        }
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: id,
        })
    }

    async fn query(&mut self, sql: &str, binds: &[BindValue]) -> Result<Vec<Row>, AppError> {
        self.record(CallKind::Query, sql, binds)?;
        let st = self.state.lock().unwrap();
        let sql = sql.to_lowercase();
        Ok(st
            .scripted
            .iter()
            .find(|(needle, _)| sql.contains(&needle.to_lowercase()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn begin(&mut self) -> Result<(), AppError> {
        self.record(CallKind::Begin, "BEGIN", &[])?;
        self.in_tx = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        self.record(CallKind::Commit, "COMMIT", &[])?;
        let mut st = self.state.lock().unwrap();
        let pending: Vec<String> = st.pending.drain(..).collect();
        st.committed.extend(pending);
        self.in_tx = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        self.in_tx = false;
        self.record(CallKind::Rollback, "ROLLBACK", &[])?;
        self.state.lock().unwrap().pending.clear();
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        let mut st = self.state.lock().unwrap();
        if self.in_tx {
            st.pending.clear();
        }
        st.sessions_closed += 1;
    }
}

pub fn column(name: &str, sql_type: &str, pk: bool) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.into(),
        sql_type: sql_type.into(),
        nullable: !pk,
        key: if pk { "PRI".into() } else { String::new() },
        is_primary_key: pk,
        is_auto_increment: pk,
        extra: if pk { "auto_increment".into() } else { String::new() },
        ..Default::default()
    }
}

pub fn users() -> TableDescriptor {
    TableDescriptor {
        name: "users".into(),
        columns: vec![
            column("id", "int", true),
            column("name", "varchar(64)", false),
            column("token", "varchar(64)", false),
        ],
        primary_keys: vec!["id".into()],
    }
}

pub fn orders() -> TableDescriptor {
    TableDescriptor {
        name: "orders".into(),
        columns: vec![
            column("id", "int", true),
            column("user_id", "int", false),
            column("item", "varchar(64)", false),
        ],
        primary_keys: vec!["id".into()],
    }
}

/// A table without a primary key.
pub fn events() -> TableDescriptor {
    TableDescriptor {
        name: "events".into(),
        columns: vec![column("msg", "text", false)],
        primary_keys: vec![],
    }
}

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub async fn state_with(db: &FakeDatabase, catalog: &str) -> AppState {
    AppState::from_database(
        Arc::new(db.clone()),
        CatalogSource::Inline(catalog.to_string()),
        AuditLog::disabled(),
    )
    .await
    .unwrap()
}

pub async fn post_raw(app: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, path, &body.to_string()).await
}
