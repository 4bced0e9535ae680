//! HTTP handlers for table CRUD, free-form SQL, and catalog pipelines.

pub mod sql;
pub mod sql_api;
pub mod table;
pub mod tables;
pub use sql::run_sql;
pub use sql_api::dispatch;
pub use table::table_action;
pub use tables::list_tables;
