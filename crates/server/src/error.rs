use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    Connection(#[source] DbErr),
    #[error("Query failed: {0}")]
    Query(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{} parameter is required", parameter_label(.0))]
    MissingParameter(&'static str),
    #[error("Invalid parameters: {0}")]
    InvalidParameter(String),
    #[error("No data found for IP: {0}")]
    NotFound(String),
    #[error("API Error: {0}")]
    Database(#[from] DatabaseError),
    #[error("API Error: {0}")]
    Internal(String),
}

fn parameter_label(name: &str) -> String {
    match name {
        "ip" => "IP".to_string(),
        other => other.to_string(),
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_)
            | ApiError::InvalidParameter(_)
            | ApiError::Database(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Database(e) => tracing::error!(error = %e, "request failed on database"),
            ApiError::Internal(e) => tracing::error!(error = %e, "request failed"),
            _ => tracing::debug!(error = %self, %status, "rejected request"),
        }
        (status, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

/// Turns a handler panic into the regular failure envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(detail).into_response()
}
