use hyper::{Body, Response, StatusCode};
use serde_json::json;

use super::macros::make_response;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotConfigured,
    Storage(anyhow::Error),
    Internal(anyhow::Error),
    MethodNotAllowed,
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Message exposed to the caller; storage causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::NotConfigured => "DATABASE_URL not configured".to_string(),
            ApiError::Storage(_) => "Database operation failed".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
            ApiError::NotFound => "Not found".to_string(),
        }
    }

    pub fn into_response(self) -> Response<Body> {
        match &self {
            ApiError::Storage(err) => tracing::error!(error = ?err, "storage failure"),
            ApiError::Internal(err) => tracing::error!(error = ?err, "internal failure"),
            ApiError::NotConfigured => tracing::warn!("run store requested without DATABASE_URL"),
            ApiError::Validation(msg) => tracing::debug!(%msg, "rejected request"),
            ApiError::MethodNotAllowed | ApiError::NotFound => {}
        }
        make_response!(self.status(), json!({ "error": self.public_message() }))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Storage(err) => write!(f, "storage error: {err:#}"),
            ApiError::Internal(err) => write!(f, "internal error: {err:#}"),
            other => write!(f, "{}", other.public_message()),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Storage(err) | ApiError::Internal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Validation(format!("Invalid request body: {err}"))
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        ApiError::Validation(format!("Failed to read request body: {err}"))
    }
}
