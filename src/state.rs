//! Shared application state for all routes. The snapshot is replaced whole on reload;
//! requests keep the `Arc` they cloned on entry.

use crate::audit::AuditLog;
use crate::config::{load_catalog, load_catalog_file, resolve, ApiSnapshot, DbApiSettings};
use crate::error::{AppError, ConfigError};
use crate::service::Database;
use crate::store::MySqlDatabase;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Where the `<sqlApi>` catalog is read from on init and reload.
#[derive(Clone, Debug)]
pub enum CatalogSource {
    None,
    File(PathBuf),
    Inline(String),
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub audit: AuditLog,
    catalog: CatalogSource,
    snapshot: Arc<RwLock<Arc<ApiSnapshot>>>,
}

async fn build_snapshot(db: &dyn Database, catalog: &CatalogSource) -> Result<ApiSnapshot, AppError> {
    let tables = db.tables().await?;
    let apis = match catalog {
        CatalogSource::None => Vec::new(),
        CatalogSource::File(path) => load_catalog_file(path).await?,
        CatalogSource::Inline(xml) => load_catalog(xml)?,
    };
    tracing::info!(tables = tables.len(), apis = apis.len(), "db api snapshot built");
    Ok(resolve(tables, apis))
}

impl AppState {
    /// Introspect `db`, load the catalog and build the first snapshot.
    pub async fn from_database(db: Arc<dyn Database>, catalog: CatalogSource, audit: AuditLog) -> Result<Self, AppError> {
        let snapshot = build_snapshot(db.as_ref(), &catalog).await?;
        Ok(AppState {
            db,
            audit,
            catalog,
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        })
    }

    pub fn snapshot(&self) -> Arc<ApiSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-introspect and re-read the catalog, then publish the new snapshot atomically.
    pub async fn reload(&self) -> Result<Arc<ApiSnapshot>, AppError> {
        let next = Arc::new(build_snapshot(self.db.as_ref(), &self.catalog).await?);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = Arc::clone(&next),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&next),
        }
        Ok(next)
    }
}

/// Initialize the db api from typed settings. Disabled settings yield `None`; calling again yields an equivalent state.
pub async fn init_db_api(settings: &DbApiSettings) -> Result<Option<AppState>, AppError> {
    if !settings.enable_db_api {
        tracing::info!("enableDbApi is off, db api not initialized");
        return Ok(None);
    }
    let audit = AuditLog::open(&settings.log_path)
        .await
        .map_err(ConfigError::from)?;
    let db = MySqlDatabase::connect(&settings.db).await?;
    let catalog = settings
        .sql_api_conf
        .as_ref()
        .map(|p| CatalogSource::File(PathBuf::from(p)))
        .unwrap_or(CatalogSource::None);
    AppState::from_database(Arc::new(db), catalog, audit).await.map(Some)
}
