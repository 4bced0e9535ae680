use crate::response::success;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

/// `GET|POST /tables`: every introspected table descriptor.
pub async fn list_tables(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    success(snapshot.tables.clone())
}
