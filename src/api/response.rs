//! JSON envelope shared by every endpoint and the DomainError -> HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::DomainError;

/// Successful outcome of a command, rendered as
/// `{"success": true, "message": ..., "data": ...}`
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<Value>,
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message)
        }
    }

    /// Serialize `data` into the payload
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self, DomainError> {
        let value =
            serde_json::to_value(data).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.data = Some(value);
        Ok(self)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": true,
            "message": self.message,
        });
        if let Some(data) = self.data {
            body["data"] = data;
        }
        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            DomainError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": "Validation failed.",
                    "errors": errors,
                }),
            ),
            DomainError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({"success": false, "message": "Not found."}),
            ),
            DomainError::PermissionDenied(msg) => (
                StatusCode::FORBIDDEN,
                json!({"success": false, "message": msg}),
            ),
            DomainError::Conflict(msg) => (
                StatusCode::BAD_REQUEST,
                json!({"success": false, "message": msg}),
            ),
            DomainError::Unauthenticated(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({"success": false, "message": msg}),
            ),
            other @ (DomainError::Database(_)
            | DomainError::Storage(_)
            | DomainError::Internal(_)) => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"success": false, "message": "Internal server error."}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
