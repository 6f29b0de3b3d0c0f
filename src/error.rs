use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures raised by the command and form surfaces. The projection engine
/// itself is total and never produces one of these.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid parameter: {field} - {message}")]
    InvalidParameter { field: String, message: String },

    #[error("Could not read {field}: {value:?} is not a number")]
    Parse { field: String, value: String },

    #[error("Malformed request: {0}")]
    Request(String),

    #[error("Input closed before all parameters were entered")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidParameter { .. } | AppError::Parse { .. } | AppError::Request(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InputClosed | AppError::Io(_) | AppError::Export { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "request rejected");
            self.to_string()
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        response.headers_mut().insert(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static("no-store"),
        );
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;
