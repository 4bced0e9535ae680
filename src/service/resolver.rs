//! Materialize a parsed template against the request body and the pipeline-local scope.
//!
//! Unknown result references resolve to the empty string rather than failing.

use crate::config::{ParamKind, SqlTemplate};
use crate::error::AppError;
use crate::sql::{bind_token, substitute_text, BindValue};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-invocation string scope: seed params, `<id>.id` and `<id>.<col>` entries.
pub type LocalScope = BTreeMap<String, String>;

#[derive(Debug, PartialEq)]
pub struct ResolvedSql {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Render a JSON value for textual use: strings raw, null empty, everything else as JSON text.
pub fn stringify(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}

pub fn resolve(template: &SqlTemplate, request: &Map<String, Value>, scope: &LocalScope) -> ResolvedSql {
    let sql = if template.text_subs.is_empty() {
        template.sql_origin.clone()
    } else {
        substitute_text(&template.sql_origin, |key| {
            scope
                .get(key)
                .cloned()
                .or_else(|| request.get(key).map(stringify))
                .unwrap_or_default()
        })
    };

    let binds = template
        .bind_list
        .iter()
        .map(|p| match p.kind {
            ParamKind::Result => BindValue::String(scope.get(&p.key).cloned().unwrap_or_default()),
            ParamKind::Post | ParamKind::Param => request
                .get(&p.key)
                .map(BindValue::from_json)
                .unwrap_or(BindValue::Null),
        })
        .collect();

    ResolvedSql { sql, binds }
}

/// Substitute a `${name}` token in a table attribute; the request body wins over the local scope.
pub fn resolve_table(table: &str, request: &Map<String, Value>, scope: &LocalScope) -> Result<String, AppError> {
    let Some((name, range)) = bind_token(table) else {
        return Ok(table.to_string());
    };
    let value = request
        .get(name)
        .filter(|v| !v.is_null())
        .map(stringify)
        .or_else(|| scope.get(name).cloned())
        .ok_or_else(|| AppError::input(format!("table parameter {} is not provided", name)))?;
    let mut out = String::with_capacity(table.len() + value.len());
    out.push_str(&table[..range.start]);
    out.push_str(&value);
    out.push_str(&table[range.end..]);
    Ok(out)
}
