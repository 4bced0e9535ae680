//! Catalog validation: every `<sqlApi>` needs a path, every `<sql>` needs a body or a usable shorthand.

use crate::config::{RawSqlApi, StatementType};
use crate::error::ConfigError;

pub fn validate(raw: &RawSqlApi) -> Result<(), ConfigError> {
    let path = raw.path.trim();
    if path.is_empty() || path == "/" {
        return Err(ConfigError::InvalidEntry {
            path: raw.path.clone(),
            reason: "missing path".into(),
        });
    }
    let invalid = |reason: String| ConfigError::InvalidEntry {
        path: path.to_string(),
        reason,
    };

    for (i, sql) in raw.sqls.iter().enumerate() {
        if !sql.body.trim().is_empty() {
            continue;
        }
        let ty = sql.ty.trim();
        if ty.is_empty() {
            return Err(invalid(format!("sql #{} has neither a body nor a type", i)));
        }
        ty.parse::<StatementType>()
            .map_err(|_| invalid(format!("sql #{} has unknown type '{}'", i, ty)))?;
        if sql.table.trim().is_empty() {
            return Err(invalid(format!("sql #{} of type {} needs a table", i, ty)));
        }
    }

    for key in raw.params.iter().map(|(k, _)| k) {
        if key.trim().is_empty() {
            return Err(invalid("param with empty key".into()));
        }
    }
    Ok(())
}
