//! Run a `SqlApi`: mandatory-input check, optional transaction, sequential statements on one session,
//! id forwarding through the local scope, and the pass-error policy.

use crate::config::{SqlApi, SqlConf, TableDescriptor, GUID_PLACEHOLDER};
use crate::error::AppError;
use crate::service::resolver::LocalScope;
use crate::service::session::{Database, Row};
use crate::service::statement::{StatementExecutor, StatementOutcome};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Every `must` key has to be present and non-null.
pub fn check_must(api: &SqlApi, request: &Map<String, Value>) -> Result<(), AppError> {
    for key in &api.must {
        if request.get(key).map_or(true, Value::is_null) {
            return Err(AppError::input(format!("{} is required", key)));
        }
    }
    Ok(())
}

/// Copy the declared params; each `{{guid}}` becomes a fresh UUID for this invocation.
pub fn seed_scope(params: &BTreeMap<String, String>) -> LocalScope {
    params
        .iter()
        .map(|(k, v)| {
            let v = if v == GUID_PLACEHOLDER {
                uuid::Uuid::new_v4().to_string()
            } else {
                v.clone()
            };
            (k.clone(), v)
        })
        .collect()
}

fn absorb(conf: &SqlConf, outcome: StatementOutcome, scope: &mut LocalScope, result: &mut Vec<Row>) {
    let rows = match outcome {
        StatementOutcome::Written {
            last_insert_id: Some(id),
            ..
        } => {
            if !conf.id.is_empty() {
                scope.insert(format!("{}.id", conf.id), id.to_string());
            }
            return;
        }
        StatementOutcome::Written { .. } => return,
        StatementOutcome::Rows(rows) => rows,
        StatementOutcome::Count(n) => vec![Row::from([("count".to_string(), n.to_string())])],
    };
    if !conf.id.is_empty() {
        if let Some(first) = rows.first() {
            for (col, v) in first {
                scope.insert(format!("{}.{}", conf.id, col), v.clone());
            }
        }
    }
    result.extend(rows);
}

pub struct PipelineExecutor<'a> {
    db: &'a dyn Database,
    tables: &'a HashMap<String, TableDescriptor>,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(db: &'a dyn Database, tables: &'a HashMap<String, TableDescriptor>) -> Self {
        PipelineExecutor { db, tables }
    }

    /// Returns the selected rows followed, when non-empty, by the final local scope.
    pub async fn run(&self, api: &SqlApi, request: &Map<String, Value>) -> Result<Vec<Row>, AppError> {
        check_must(api, request)?;
        let mut scope = seed_scope(&api.params);

        let mut session = self.db.session().await?;
        if api.transaction {
            session.begin().await?;
        }

        let executor = StatementExecutor::new(self.tables);
        let mut result = Vec::new();
        for conf in &api.sqls {
            match executor.execute(session.as_mut(), conf, request, &scope).await {
                Ok(outcome) => absorb(conf, outcome, &mut scope, &mut result),
                Err(e) if api.pass_error => {
                    tracing::warn!(path = %api.path, id = %conf.id, "statement failed, continuing: {}", e);
                }
                Err(e) => {
                    if api.transaction {
                        if let Err(rb) = session.rollback().await {
                            tracing::warn!(path = %api.path, "rollback failed: {}", rb);
                        }
                    }
                    return Err(e);
                }
            }
        }

        if !scope.is_empty() {
            result.push(scope);
        }
        if api.transaction {
            if let Err(e) = session.commit().await {
                tracing::error!(path = %api.path, "commit failed: {}", e);
            }
        }
        Ok(result)
    }
}
