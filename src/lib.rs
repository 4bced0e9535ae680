//! dbrest: schema-introspected CRUD and declarative SQL pipelines over HTTP JSON.

pub mod audit;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use audit::AuditLog;
pub use config::{load_catalog, load_catalog_file, resolve, ApiSnapshot, DbApiSettings, SqlApi, TableDescriptor};
pub use error::{AppError, ConfigError};
pub use response::ApiResponse;
pub use routes::{common_routes, db_api_routes};
pub use service::{CrudService, Database, PipelineExecutor, Session};
pub use state::{init_db_api, AppState, CatalogSource};
pub use store::MySqlDatabase;
