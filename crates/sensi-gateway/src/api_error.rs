//! Maps core errors to `{ "error": "..." }` bodies. Raw causes are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sensi_core::{SensiError, StoreError};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Core(SensiError),
    BadRequest(String),
    NotFound(&'static str),
    Unauthorized,
}

impl From<SensiError> for ApiError {
    fn from(err: SensiError) -> Self {
        ApiError::Core(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Core(SensiError::Store(err))
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Incorrect ID or Key".to_string()),
            ApiError::Core(err) => match err {
                SensiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                SensiError::NoPreset(ram) => (
                    StatusCode::NOT_FOUND,
                    format!("Sorry, no preset sensitivity found for {} RAM.", ram),
                ),
                SensiError::UnknownProduct(_) => (StatusCode::NOT_FOUND, "Product not found.".to_string()),
                SensiError::InvalidStep { .. } => (
                    StatusCode::CONFLICT,
                    "That action is not available at this step.".to_string(),
                ),
                SensiError::AccessDenied => (
                    StatusCode::FORBIDDEN,
                    "Legendary access is required for the AI Sensitivity Expert.".to_string(),
                ),
                SensiError::GenAi(_) => (
                    StatusCode::BAD_GATEWAY,
                    "The AI service is unavailable. Please try again.".to_string(),
                ),
                SensiError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not reach the content store. Please try again.".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        if status.is_server_error() {
            if let ApiError::Core(err) = &self {
                tracing::error!("[SENSI SYSTEM] {} -> {}", err, status);
            }
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
