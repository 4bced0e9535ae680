//! Builds parameterized INSERT, SELECT, UPDATE, DELETE, COUNT for shorthand statements.
//! Identifiers are checked by the caller; values always go to `params`.

use crate::sql::BindValue;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn push_param(&mut self, v: &Value) {
        self.params.push(BindValue::from_json(v));
    }
}

/// Plain or schema-qualified SQL identifier (`users`, `shop.users`).
pub fn is_identifier(s: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$").expect("static identifier pattern")
    })
    .is_match(s)
}

fn where_clause(q: &mut QueryBuf, filters: &[(String, Value)]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = filters
        .iter()
        .map(|(col, val)| {
            q.push_param(val);
            format!("{} = ?", col)
        })
        .collect();
    format!(" WHERE {}", parts.join(" AND "))
}

/// `INSERT INTO t (k1,k2) VALUES (?,?)` in the given column order.
pub fn insert(table: &str, values: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::default();
    let cols: Vec<&str> = values.iter().map(|(c, _)| c.as_str()).collect();
    for (_, v) in values {
        q.push_param(v);
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        cols.join(","),
        vec!["?"; cols.len()].join(",")
    );
    q
}

/// `SELECT * FROM t [WHERE k = ? AND ...]`; no filters selects everything.
pub fn select(table: &str, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::default();
    let wc = where_clause(&mut q, filters);
    q.sql = format!("SELECT * FROM {}{}", table, wc);
    q
}

pub fn count(table: &str, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::default();
    let wc = where_clause(&mut q, filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", table, wc);
    q
}

/// `UPDATE t SET a=?, b=? WHERE pk=?`; the id is bound last.
pub fn update(table: &str, pk: &str, id: &Value, sets: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::default();
    let assignments: Vec<String> = sets
        .iter()
        .map(|(col, val)| {
            q.push_param(val);
            format!("{}=?", col)
        })
        .collect();
    q.push_param(id);
    q.sql = format!("UPDATE {} SET {} WHERE {}=?", table, assignments.join(", "), pk);
    q
}

pub fn delete(table: &str, pk: &str, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::default();
    q.push_param(id);
    q.sql = format!("DELETE FROM {} WHERE {}=?", table, pk);
    q
}
