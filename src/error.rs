//! Typed errors and HTTP mapping.

use crate::response::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("catalog xml: {0}")]
    Xml(String),
    #[error("sqlApi {path}: {reason}")]
    InvalidEntry { path: String, reason: String },
    #[error("settings: {0}")]
    Settings(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Malformed body, missing mandatory parameter, forbidden `/sql` text.
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn input(msg: impl Into<String>) -> Self {
        AppError::Input(msg.into())
    }

    /// The generic rejection for undecodable request bodies.
    pub fn parameter_error() -> Self {
        AppError::Input("parameter error".into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}
