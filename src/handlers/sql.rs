//! Free-form `POST /sql`: body `{"sql": "..."}`, rows back. DELETE is refused.

use crate::audit::SQL_LOG;
use crate::error::AppError;
use crate::extractors::RequiredJsonParams;
use crate::response::success;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, State},
    http::{header::USER_AGENT, HeaderMap},
    response::IntoResponse,
};
use std::net::SocketAddr;

/// Trimmed SQL text, rejecting empty input and anything mentioning DELETE.
pub fn checked_sql(raw: &str) -> Result<&str, AppError> {
    let sql = raw.trim();
    if sql.is_empty() {
        return Err(AppError::input("sql parameter is empty"));
    }
    if sql.to_uppercase().contains("DELETE") {
        return Err(AppError::input("sql parameter must not contain delete"));
    }
    Ok(sql)
}

pub async fn run_sql(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    RequiredJsonParams(params): RequiredJsonParams,
) -> Result<impl IntoResponse, AppError> {
    let raw = params
        .get("sql")
        .and_then(|v| v.as_str())
        .ok_or_else(AppError::parameter_error)?;
    let sql = checked_sql(raw)?;

    let client = addr.map(|ConnectInfo(a)| a.to_string()).unwrap_or_else(|| "-".to_string());
    let agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    state
        .audit
        .record(SQL_LOG, &format!("{} {} {}", client, agent, sql))
        .await;

    let rows = CrudService::query(state.db.as_ref(), sql).await?;
    Ok(success(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_delete() {
        assert_eq!(checked_sql("  \n").unwrap_err().to_string(), "sql parameter is empty");
        assert!(checked_sql("delete from users").is_err());
        assert!(checked_sql("select * from t where note = 'undeleted'").is_err());
        assert_eq!(checked_sql(" select 1 ").unwrap(), "select 1");
    }
}
