//! Immutable runtime snapshot: introspected tables plus the compiled catalog, indexed for lookup.

use crate::config::SqlApi;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    /// Full column type as reported by the database (e.g. `varchar(64)`, `int unsigned`).
    #[serde(rename = "type")]
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// Index role: `PRI`, `UNI`, `MUL` or empty.
    pub key: String,
    pub extra: String,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Ordered primary key columns; empty for tables without a primary key.
    pub primary_keys: Vec<String>,
}

impl TableDescriptor {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_keys.first().map(String::as_str)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ApiSnapshot {
    pub tables: Vec<TableDescriptor>,
    pub table_by_name: HashMap<String, TableDescriptor>,
    pub api_by_path: HashMap<String, SqlApi>,
}

impl ApiSnapshot {
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.table_by_name.get(name)
    }

    pub fn api(&self, path: &str) -> Option<&SqlApi> {
        self.api_by_path.get(path)
    }
}

/// Normalise a route path to a single leading slash.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}

/// Build a snapshot. A later catalog entry with an already-registered path replaces the earlier one.
pub fn resolve(tables: Vec<TableDescriptor>, apis: Vec<SqlApi>) -> ApiSnapshot {
    let table_by_name = tables.iter().map(|t| (t.name.clone(), t.clone())).collect();
    let mut api_by_path = HashMap::new();
    for mut api in apis {
        api.path = normalize_path(&api.path);
        tracing::info!(path = %api.path, statements = api.sqls.len(), "registering sqlApi");
        if api_by_path.contains_key(&api.path) {
            tracing::warn!("sqlApi path {} declared more than once, keeping the last", api.path);
        }
        api_by_path.insert(api.path.clone(), api);
    }
    ApiSnapshot {
        tables,
        table_by_name,
        api_by_path,
    }
}
