//! Compiled catalog types: one `SqlApi` per `<sqlApi>` element, one `SqlConf` per `<sql>`.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Seed value replaced by a fresh UUID once per pipeline invocation.
pub const GUID_PLACEHOLDER: &str = "{{guid}}";

/// Where a parameter's value comes from at resolution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// `${name}`: bind value from the request body.
    Post,
    /// `${stmt.field}`: bind value from an earlier statement, via the local scope.
    Result,
    /// `#{name}`: textual substitution, local scope first, then request body.
    Param,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlParam {
    pub kind: ParamKind,
    /// For `Result`, `"<stmtId>.<field>"`; otherwise the scope name.
    pub key: String,
}

impl SqlParam {
    pub fn new(kind: ParamKind, key: impl Into<String>) -> Self {
        SqlParam {
            kind,
            key: key.into(),
        }
    }
}

/// A parsed SQL template: canonical SQL with `?` per bind plus the literal `#{..}` tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlTemplate {
    pub sql_origin: String,
    /// One entry per `?` in `sql_origin`, left to right.
    pub bind_list: Vec<SqlParam>,
    /// One entry per `#{..}` occurrence.
    pub text_subs: Vec<SqlParam>,
}

/// Verb of a shorthand statement (no SQL text).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementType {
    Insert,
    Select,
    Update,
    Delete,
    Count,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Insert => "insert",
            StatementType::Select => "select",
            StatementType::Update => "update",
            StatementType::Delete => "delete",
            StatementType::Count => "count",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(StatementType::Insert),
            "select" => Ok(StatementType::Select),
            "update" => Ok(StatementType::Update),
            "delete" => Ok(StatementType::Delete),
            "count" => Ok(StatementType::Count),
            other => Err(ConfigError::Xml(format!("unknown sql type '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlBody {
    Templated(SqlTemplate),
    Shorthand(StatementType),
}

/// One statement of a pipeline, or the bare statement behind a generated CRUD endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlConf {
    /// Local handle used for `<id>.id` / `<id>.<col>` scope entries. May be empty.
    pub id: String,
    /// Target table; may contain a `${name}` token resolved per invocation. May be empty for templated SQL.
    pub table: String,
    pub body: SqlBody,
}

impl SqlConf {
    pub fn shorthand(table: impl Into<String>, ty: StatementType) -> Self {
        let table = table.into();
        SqlConf {
            id: table.clone(),
            table,
            body: SqlBody::Shorthand(ty),
        }
    }

    pub fn has_sql(&self) -> bool {
        matches!(self.body, SqlBody::Templated(_))
    }
}

/// A named pipeline registered at `path`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SqlApi {
    pub path: String,
    pub transaction: bool,
    pub pass_error: bool,
    /// Request keys that must be present and non-null.
    pub must: Vec<String>,
    /// Local scope seed; values equal to `{{guid}}` are replaced per invocation.
    pub params: BTreeMap<String, String>,
    pub sqls: Vec<SqlConf>,
}
