//! Catalog pipelines, dispatched by request path from the router fallback.

use crate::config::{normalize_path, ApiSnapshot, SqlApi};
use crate::error::AppError;
use crate::extractors::JsonParams;
use crate::response::success;
use crate::service::{PipelineExecutor, Row};
use crate::state::AppState;
use axum::{extract::State, http::Uri, response::IntoResponse};
use serde_json::{Map, Value};

pub(crate) async fn run_api(
    state: &AppState,
    snapshot: &ApiSnapshot,
    api: &SqlApi,
    params: &Map<String, Value>,
) -> Result<Vec<Row>, AppError> {
    tracing::debug!(path = %api.path, "running sqlApi");
    PipelineExecutor::new(state.db.as_ref(), &snapshot.table_by_name)
        .run(api, params)
        .await
}

pub async fn dispatch(
    State(state): State<AppState>,
    uri: Uri,
    JsonParams(params): JsonParams,
) -> Result<impl IntoResponse, AppError> {
    let path = normalize_path(uri.path());
    let snapshot = state.snapshot();
    let api = snapshot
        .api(&path)
        .ok_or_else(|| AppError::NotFound(format!("no sqlApi configured for path {}", path)))?;
    let rows = run_api(&state, &snapshot, api, &params).await?;
    Ok(success(rows))
}
