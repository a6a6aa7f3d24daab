use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::services::validation::FieldErrors;

/// Errors surfaced by the client, its services and the session layer.
///
/// Validation errors are produced locally and never reach the network.
/// `Unauthorized` on an authenticated call means the session has already been torn down.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Request failed ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Request {
        #[serde(serialize_with = "serialize_status")]
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_u16(status.as_u16())
}

impl ServiceError {
    /// Maps a non-success response onto the error taxonomy.
    pub fn from_response(status: StatusCode, detail: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => {
                ServiceError::Unauthorized(detail.unwrap_or_else(|| status.to_string()))
            }
            StatusCode::FORBIDDEN => {
                ServiceError::Forbidden(detail.unwrap_or_else(|| status.to_string()))
            }
            StatusCode::NOT_FOUND => {
                ServiceError::NotFound(detail.unwrap_or_else(|| status.to_string()))
            }
            _ => ServiceError::Request { status, detail },
        }
    }

    /// HTTP status associated with the error, when it came from the backend.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::Request { status, .. } => Some(*status),
            ServiceError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ServiceError::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            ServiceError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    /// Network failures can be retried by re-issuing the operation.
    /// Nothing is retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Network(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized(_))
    }

    /// Message suitable for showing to an operator: the server's detail when
    /// it sent one, otherwise a generic description.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(errors) => errors.to_string(),
            ServiceError::Request {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ServiceError::Request { status, .. } => format!("request failed with status {status}"),
            ServiceError::Unauthorized(msg)
            | ServiceError::Forbidden(msg)
            | ServiceError::NotFound(msg) => msg.clone(),
            ServiceError::Network(_) => "could not reach the server, please retry".to_string(),
            other => other.to_string(),
        }
    }
}

/// Extracts the human readable `detail` from a backend error body.
///
/// The backend sends either `{"detail": "..."}` or, for request validation
/// failures, `{"detail": [{"loc": [...], "msg": "..."}]}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Serialization(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::from_response(status, None)
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(FieldErrors::from(err))
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::Validation(errors)
    }
}
