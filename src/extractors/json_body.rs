//! Extract request parameters from a JSON object body.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

/// Decode failures, non-object bodies and empty bodies all give an empty map.
pub fn parse_lenient(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) => m,
        _ => Map::new(),
    }
}

/// A non-empty JSON object, or `parameter error`.
pub fn parse_strict(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) if !m.is_empty() => Ok(m),
        _ => Err(AppError::parameter_error()),
    }
}

/// Parameters for read-mostly endpoints. Never rejects.
#[derive(Clone, Debug, Default)]
pub struct JsonParams(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonParams
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let params = Bytes::from_request(req, state)
            .await
            .map(|b| parse_lenient(&b))
            .unwrap_or_default();
        Ok(JsonParams(params))
    }
}

/// Parameters for write endpoints. Rejects with `-1, "parameter error"`.
#[derive(Clone, Debug)]
pub struct RequiredJsonParams(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for RequiredJsonParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::parameter_error())?;
        parse_strict(&bytes).map(RequiredJsonParams)
    }
}
