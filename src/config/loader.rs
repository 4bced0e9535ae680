//! Load the `<sqlApi>` catalog from XML and compile each entry into a `SqlApi`.
//!
//! ```xml
//! <sqlApi path="/foo" transaction="true" passError="false">
//!   <must>a,b,c</must>
//!   <param key="k" value="{{guid}}"/>
//!   <sql id="s1" table="t">INSERT ... ${x} ... #{col}</sql>
//!   <sql id="s2" type="select" table="${tbl}"/>
//! </sqlApi>
//! ```
//!
//! Entries that fail validation are logged and skipped; a malformed document fails as a whole.

use crate::config::{validate, SqlApi, SqlBody, SqlConf};
use crate::error::ConfigError;
use crate::sql::parse_template;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One `<sql>` element as written.
#[derive(Clone, Debug, Default)]
pub struct RawSql {
    /// None when the attribute is absent; the positional index is used instead.
    pub id: Option<String>,
    pub ty: String,
    pub table: String,
    pub body: String,
}

/// One `<sqlApi>` element as written.
#[derive(Clone, Debug, Default)]
pub struct RawSqlApi {
    pub path: String,
    pub transaction: bool,
    pub pass_error: bool,
    pub must: Vec<String>,
    pub params: Vec<(String, String)>,
    pub sqls: Vec<RawSql>,
}

#[derive(PartialEq)]
enum Capture {
    Nothing,
    Sql,
    Must,
}

fn xml_err(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Xml(e.to_string())
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, ConfigError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn is_true(attrs: &HashMap<String, String>, key: &str) -> bool {
    attrs
        .get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn start_api(e: &BytesStart<'_>) -> Result<RawSqlApi, ConfigError> {
    let attrs = attributes(e)?;
    Ok(RawSqlApi {
        path: attrs.get("path").cloned().unwrap_or_default(),
        transaction: is_true(&attrs, "transaction"),
        pass_error: is_true(&attrs, "passError"),
        ..Default::default()
    })
}

fn start_sql(e: &BytesStart<'_>) -> Result<RawSql, ConfigError> {
    let mut attrs = attributes(e)?;
    Ok(RawSql {
        id: attrs.remove("id"),
        ty: attrs.remove("type").unwrap_or_default(),
        table: attrs.remove("table").unwrap_or_default(),
        body: String::new(),
    })
}

fn param(e: &BytesStart<'_>) -> Result<(String, String), ConfigError> {
    let mut attrs = attributes(e)?;
    Ok((
        attrs.remove("key").unwrap_or_default(),
        attrs.remove("value").unwrap_or_default(),
    ))
}

fn split_must(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parse the document into raw entries without validating them.
pub fn parse_catalog(xml: &str) -> Result<Vec<RawSqlApi>, ConfigError> {
    let mut reader = Reader::from_str(xml);
    let mut apis = Vec::new();
    let mut current: Option<RawSqlApi> = None;
    let mut pending_sql: Option<RawSql> = None;
    let mut capture = Capture::Nothing;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"sqlApi" => current = Some(start_api(&e)?),
                b"sql" if current.is_some() => {
                    pending_sql = Some(start_sql(&e)?);
                    capture = Capture::Sql;
                    text.clear();
                }
                b"must" if current.is_some() => {
                    capture = Capture::Must;
                    text.clear();
                }
                b"param" => {
                    if let Some(api) = current.as_mut() {
                        api.params.push(param(&e)?);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"sqlApi" => apis.push(start_api(&e)?),
                b"sql" => {
                    if let Some(api) = current.as_mut() {
                        api.sqls.push(start_sql(&e)?);
                    }
                }
                b"param" => {
                    if let Some(api) = current.as_mut() {
                        api.params.push(param(&e)?);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if capture != Capture::Nothing {
                    text.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Ok(Event::CData(c)) => {
                if capture != Capture::Nothing {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"sql" => {
                    if let (Some(api), Some(mut sql)) = (current.as_mut(), pending_sql.take()) {
                        sql.body = text.trim().to_string();
                        api.sqls.push(sql);
                    }
                    capture = Capture::Nothing;
                }
                b"must" => {
                    if let Some(api) = current.as_mut() {
                        api.must.extend(split_must(&text));
                    }
                    capture = Capture::Nothing;
                }
                b"sqlApi" => {
                    if let Some(api) = current.take() {
                        apis.push(api);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConfigError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }
    Ok(apis)
}

/// Validate one raw entry and compile its SQL templates.
pub fn compile(raw: RawSqlApi) -> Result<SqlApi, ConfigError> {
    validate(&raw)?;
    let path = raw.path.trim().to_string();
    let mut sqls = Vec::with_capacity(raw.sqls.len());
    for (i, sql) in raw.sqls.into_iter().enumerate() {
        let body = if sql.body.trim().is_empty() {
            SqlBody::Shorthand(sql.ty.parse().map_err(|e: ConfigError| {
                ConfigError::InvalidEntry {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?)
        } else {
            SqlBody::Templated(parse_template(sql.body.trim()))
        };
        sqls.push(SqlConf {
            id: sql.id.unwrap_or_else(|| i.to_string()),
            table: sql.table.trim().to_string(),
            body,
        });
    }
    let params: BTreeMap<String, String> = raw.params.into_iter().collect();
    Ok(SqlApi {
        path,
        transaction: raw.transaction,
        pass_error: raw.pass_error,
        must: raw.must,
        params,
        sqls,
    })
}

/// Parse and compile a catalog. Invalid entries are skipped with a warning.
pub fn load_catalog(xml: &str) -> Result<Vec<SqlApi>, ConfigError> {
    let mut apis = Vec::new();
    for raw in parse_catalog(xml)? {
        let path = raw.path.clone();
        match compile(raw) {
            Ok(api) => apis.push(api),
            Err(e) => tracing::warn!(path = %path, "skipping sqlApi: {}", e),
        }
    }
    Ok(apis)
}

pub async fn load_catalog_file(path: impl AsRef<Path>) -> Result<Vec<SqlApi>, ConfigError> {
    let xml = tokio::fs::read_to_string(path.as_ref()).await?;
    load_catalog(&xml)
}
