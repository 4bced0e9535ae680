//! Generated per-table endpoints: `POST /:table/:action`.

use crate::config::{normalize_path, TableDescriptor};
use crate::error::AppError;
use crate::extractors::{parse_lenient, parse_strict};
use crate::handlers::sql_api::run_api;
use crate::response::{success, success_msg};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::Uri,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

async fn audit(state: &AppState, table: &TableDescriptor, action: &str, params: &Map<String, Value>) {
    let entry = format!("{} {}", action, Value::Object(params.clone()));
    state.audit.record(&table.name, &entry).await;
}

pub async fn table_action(
    State(state): State<AppState>,
    Path((table, action)): Path<(String, String)>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, AppError> {
    let snapshot = state.snapshot();

    // Catalog entries registered at this path take precedence.
    if let Some(api) = snapshot.api(&normalize_path(uri.path())) {
        let rows = run_api(&state, &snapshot, api, &parse_lenient(&body)).await?;
        return Ok(success(rows).into_response());
    }

    let t = snapshot
        .table(&table)
        .ok_or_else(|| AppError::NotFound(format!("table {} not found", table)))?;
    let db = state.db.as_ref();
    let tables = &snapshot.table_by_name;

    let response = match action.as_str() {
        "insert" => {
            let params = parse_strict(&body)?;
            audit(&state, t, "insert", &params).await;
            success(CrudService::insert(db, tables, t, &params).await?).into_response()
        }
        "update" => {
            let params = parse_strict(&body)?;
            audit(&state, t, "update", &params).await;
            success_msg("success", CrudService::update(db, tables, t, &params).await?).into_response()
        }
        "delete" => {
            let params = parse_strict(&body)?;
            audit(&state, t, "delete", &params).await;
            success_msg("success", CrudService::delete(db, tables, t, &params).await?).into_response()
        }
        "select" => {
            let params = parse_lenient(&body);
            audit(&state, t, "select", &params).await;
            success(CrudService::select(db, tables, t, &params).await?).into_response()
        }
        "count" => {
            let params = parse_lenient(&body);
            audit(&state, t, "count", &params).await;
            success(CrudService::count(db, tables, t, &params).await?).into_response()
        }
        "schema" => success(&t.columns).into_response(),
        other => {
            return Err(AppError::NotFound(format!(
                "unknown action {} for table {}",
                other, t.name
            )))
        }
    };
    Ok(response)
}
