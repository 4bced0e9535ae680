//! Execute one `SqlConf` against a session: exactly one database round-trip.

use crate::config::{SqlBody, SqlConf, StatementType, TableDescriptor};
use crate::error::AppError;
use crate::service::resolver::{resolve, resolve_table, LocalScope};
use crate::service::session::{Row, Session};
use crate::sql::builder::{self, is_identifier, QueryBuf};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum StatementOutcome {
    /// INSERT/UPDATE/DELETE. `last_insert_id` is set for templated writes and shorthand inserts.
    Written {
        rows_affected: u64,
        last_insert_id: Option<u64>,
    },
    Rows(Vec<Row>),
    Count(i64),
}

/// Lowercased leading keyword of a statement.
fn leading_verb(sql: &str) -> String {
    sql.trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn required_id(request: &Map<String, Value>) -> Result<&Value, AppError> {
    request
        .get("id")
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::input("id is required"))
}

/// Request keys usable as column names. Known tables drop unknown keys; unknown tables must pass the identifier check.
fn columns_of(
    desc: Option<&TableDescriptor>,
    request: &Map<String, Value>,
    skip: &[&str],
) -> Result<Vec<(String, Value)>, AppError> {
    let mut out = Vec::with_capacity(request.len());
    for (k, v) in request {
        if skip.contains(&k.as_str()) {
            continue;
        }
        match desc {
            Some(d) if !d.has_column(k) => continue,
            None if !is_identifier(k) => {
                return Err(AppError::input(format!("invalid column name {}", k)));
            }
            _ => out.push((k.clone(), v.clone())),
        }
    }
    Ok(out)
}

fn primary_key(desc: Option<&TableDescriptor>, verb: StatementType) -> Result<String, AppError> {
    match desc {
        Some(d) => d
            .primary_key()
            .map(String::from)
            .ok_or_else(|| AppError::input(format!("table has no primary key, cannot {}", verb))),
        None => Ok("id".into()),
    }
}

pub struct StatementExecutor<'a> {
    tables: &'a HashMap<String, TableDescriptor>,
}

impl<'a> StatementExecutor<'a> {
    pub fn new(tables: &'a HashMap<String, TableDescriptor>) -> Self {
        StatementExecutor { tables }
    }

    pub async fn execute(
        &self,
        session: &mut dyn Session,
        conf: &SqlConf,
        request: &Map<String, Value>,
        scope: &LocalScope,
    ) -> Result<StatementOutcome, AppError> {
        match &conf.body {
            SqlBody::Templated(template) => {
                let r = resolve(template, request, scope);
                tracing::debug!(id = %conf.id, sql = %r.sql, binds = ?r.binds, "statement");
                let verb = leading_verb(&r.sql);
                if matches!(verb.as_str(), "insert" | "update" | "delete") {
                    let out = session.exec(&r.sql, &r.binds).await?;
                    Ok(StatementOutcome::Written {
                        rows_affected: out.rows_affected,
                        last_insert_id: Some(out.last_insert_id),
                    })
                } else {
                    Ok(StatementOutcome::Rows(session.query(&r.sql, &r.binds).await?))
                }
            }
            SqlBody::Shorthand(ty) => {
                let table = resolve_table(&conf.table, request, scope)?;
                if !is_identifier(&table) {
                    return Err(AppError::input(format!("invalid table name {}", table)));
                }
                self.shorthand(session, *ty, &table, request).await
            }
        }
    }

    async fn shorthand(
        &self,
        session: &mut dyn Session,
        ty: StatementType,
        table: &str,
        request: &Map<String, Value>,
    ) -> Result<StatementOutcome, AppError> {
        let desc = self.tables.get(table);
        match ty {
            StatementType::Insert => {
                let q = builder::insert(table, &columns_of(desc, request, &[])?);
                let out = exec(session, &q).await?;
                Ok(StatementOutcome::Written {
                    rows_affected: out.rows_affected,
                    last_insert_id: Some(out.last_insert_id),
                })
            }
            StatementType::Select => {
                let q = builder::select(table, &columns_of(desc, request, &[])?);
                tracing::debug!(sql = %q.sql, params = ?q.params, "query");
                Ok(StatementOutcome::Rows(session.query(&q.sql, &q.params).await?))
            }
            StatementType::Count => {
                let q = builder::count(table, &columns_of(desc, request, &[])?);
                tracing::debug!(sql = %q.sql, params = ?q.params, "query");
                let rows = session.query(&q.sql, &q.params).await?;
                Ok(StatementOutcome::Count(count_of(&rows)?))
            }
            StatementType::Update => {
                let id = required_id(request)?;
                let pk = primary_key(desc, ty)?;
                let sets = columns_of(desc, request, &["id"])?;
                if sets.is_empty() {
                    return Err(AppError::input("no columns to update"));
                }
                let q = builder::update(table, &pk, id, &sets);
                let out = exec(session, &q).await?;
                Ok(StatementOutcome::Written {
                    rows_affected: out.rows_affected,
                    last_insert_id: None,
                })
            }
            StatementType::Delete => {
                let id = required_id(request)?;
                let pk = primary_key(desc, ty)?;
                let q = builder::delete(table, &pk, id);
                let out = exec(session, &q).await?;
                Ok(StatementOutcome::Written {
                    rows_affected: out.rows_affected,
                    last_insert_id: None,
                })
            }
        }
    }
}

/// The single value of a `COUNT(*)` result.
fn count_of(rows: &[Row]) -> Result<i64, AppError> {
    let Some(raw) = rows.first().and_then(|r| r.values().next()) else {
        return Ok(0);
    };
    raw.trim().parse().map_err(|_| {
        AppError::Db(sqlx::Error::Protocol(format!("count returned a non-integer value '{}'", raw)))
    })
}

async fn exec(
    session: &mut dyn Session,
    q: &QueryBuf,
) -> Result<crate::service::session::ExecOutcome, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "exec");
    session.exec(&q.sql, &q.params).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_value_must_be_an_integer() {
        let row = |v: &str| Row::from([("COUNT(*)".to_string(), v.to_string())]);
        assert_eq!(count_of(&[row(" 12 ")]).unwrap(), 12);
        assert_eq!(count_of(&[]).unwrap(), 0);
        let err = count_of(&[row("twelve")]).unwrap_err();
        assert!(matches!(err, AppError::Db(_)));
        assert!(err.to_string().contains("twelve"));
    }

    #[test]
    fn verb_detection() {
        assert_eq!(leading_verb("  INSERT INTO t VALUES (1)"), "insert");
        assert_eq!(leading_verb("\nupdate t set a = 1"), "update");
        assert_eq!(leading_verb("Delete FROM t"), "delete");
        assert_eq!(leading_verb("(SELECT 1)"), "");
        assert_eq!(leading_verb("select 1"), "select");
    }

    #[test]
    fn known_table_drops_unknown_keys() {
        let d = TableDescriptor {
            name: "users".into(),
            columns: vec![crate::config::ColumnDescriptor {
                name: "name".into(),
                sql_type: "varchar(64)".into(),
                nullable: true,
                ..Default::default()
            }],
            primary_keys: vec![],
        };
        let req: Map<String, Value> = serde_json::from_str(r#"{"name":"Ada","bogus; --":1}"#).unwrap();
        let cols = columns_of(Some(&d), &req, &[]).unwrap();
        assert_eq!(cols.len(), 1);
        assert!(columns_of(None, &req, &[]).is_err());
        assert!(primary_key(Some(&d), StatementType::Delete)
            .unwrap_err()
            .to_string()
            .starts_with("table has no primary key"));
    }
}
