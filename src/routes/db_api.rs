//! Database API routes: table listing, free-form SQL, per-table CRUD, and the catalog fallback.

use crate::handlers::{dispatch, list_tables, run_sql, table_action};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub fn db_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/tables", get(list_tables).post(list_tables))
        .route("/sql", post(run_sql))
        .route("/:table/:action", post(table_action))
        .fallback(dispatch)
        .layer(RequestBodyLimitLayer::new(DEFAULT_BODY_LIMIT))
        .with_state(state)
}
