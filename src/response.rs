//! Standard response envelope: `{code, msg, data}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub const CODE_OK: i32 = 0;
pub const CODE_FAIL: i32 = -1;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    pub data: T,
}

impl ApiResponse<Option<()>> {
    pub fn failure(msg: String) -> Self {
        ApiResponse {
            code: CODE_FAIL,
            msg,
            data: None,
        }
    }
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    success_msg("", data)
}

pub fn success_msg<T: Serialize>(msg: &str, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            code: CODE_OK,
            msg: msg.to_string(),
            data,
        }),
    )
}
