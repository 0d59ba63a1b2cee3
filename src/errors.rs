use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned for every failed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "message": "Missing required fields",
    "missing_fields": ["qty", "price"]
}))]
pub struct ErrorResponse {
    /// Human-readable error description
    pub message: String,
    /// Underlying cause (coercion failures and backend errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Required create fields that were absent from the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing client input. Never mutates state.
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        detail: Option<String>,
        missing_fields: Vec<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend or unexpected failure, tagged with the failing operation.
    #[error("{context}: {error}")]
    InternalError { context: String, error: String },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            detail: None,
            missing_fields: Vec::new(),
        }
    }

    pub fn validation_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            detail: Some(detail.into()),
            missing_fields: Vec::new(),
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::ValidationError {
            message: "Missing required fields".to_string(),
            detail: None,
            missing_fields: fields,
        }
    }

    pub fn internal(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::InternalError {
            context: context.into(),
            error: error.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the JSON body for this error. Backend failures surface the raw
    /// cause in `error`.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::ValidationError {
                message,
                detail,
                missing_fields,
            } => ErrorResponse {
                message: message.clone(),
                error: detail.clone(),
                missing_fields: if missing_fields.is_empty() {
                    None
                } else {
                    Some(missing_fields.clone())
                },
            },
            Self::NotFound(message) => ErrorResponse {
                message: message.clone(),
                error: None,
                missing_fields: None,
            },
            Self::InternalError { context, error } => ErrorResponse {
                message: context.clone(),
                error: Some(error.clone()),
                missing_fields: None,
            },
        }
    }
}
