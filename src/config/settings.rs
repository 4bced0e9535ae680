//! Typed settings for the db api, read from the flat key map (`enableDbApi`, `db.host`, ...) or env.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_log_path() -> String {
    "logs".into()
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3306
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DbSettings {
    #[serde(rename = "db.host", default = "default_host")]
    pub host: String,
    #[serde(rename = "db.port", default = "default_port")]
    pub port: u16,
    #[serde(rename = "db.user", default)]
    pub user: String,
    #[serde(rename = "db.password", default)]
    pub password: String,
    #[serde(rename = "db.database", default)]
    pub database: String,
    #[serde(rename = "db.maxConnections", default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbSettings {
    fn default() -> Self {
        DbSettings {
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DbApiSettings {
    /// Absent or false: initialization does nothing.
    #[serde(rename = "enableDbApi", default)]
    pub enable_db_api: bool,
    /// Directory for per-table and `sql.log` audit files.
    #[serde(rename = "logPath", default = "default_log_path")]
    pub log_path: String,
    /// XML catalog of `<sqlApi>` pipelines. None: only generated table endpoints.
    #[serde(rename = "sqlApiConf", default)]
    pub sql_api_conf: Option<String>,
    #[serde(flatten)]
    pub db: DbSettings,
}

impl Default for DbApiSettings {
    fn default() -> Self {
        DbApiSettings {
            enable_db_api: false,
            log_path: default_log_path(),
            sql_api_conf: None,
            db: DbSettings::default(),
        }
    }
}

impl DbApiSettings {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Settings(e.to_string()))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&raw)
    }

    /// Read `.env` (if any) then `ENABLE_DB_API`, `LOG_PATH`, `SQL_API_CONF`, `DB_HOST`, `DB_PORT`,
    /// `DB_USER`, `DB_PASSWORD`, `DB_DATABASE`, `DB_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut s = DbApiSettings::default();
        if let Some(v) = get("ENABLE_DB_API") {
            s.enable_db_api = parse_bool("ENABLE_DB_API", &v)?;
        }
        if let Some(v) = get("LOG_PATH") {
            s.log_path = v;
        }
        s.sql_api_conf = get("SQL_API_CONF").filter(|v| !v.trim().is_empty());
        if let Some(v) = get("DB_HOST") {
            s.db.host = v;
        }
        if let Some(v) = get("DB_PORT") {
            s.db.port = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Settings(format!("DB_PORT: invalid port '{}'", v)))?;
        }
        if let Some(v) = get("DB_USER") {
            s.db.user = v;
        }
        if let Some(v) = get("DB_PASSWORD") {
            s.db.password = v;
        }
        if let Some(v) = get("DB_DATABASE") {
            s.db.database = v;
        }
        if let Some(v) = get("DB_MAX_CONNECTIONS") {
            s.db.max_connections = v.trim().parse().map_err(|_| {
                ConfigError::Settings(format!("DB_MAX_CONNECTIONS: invalid number '{}'", v))
            })?;
        }
        Ok(s)
    }
}

fn parse_bool(key: &str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Settings(format!("{}: expected a boolean, got '{}'", key, v))),
    }
}
