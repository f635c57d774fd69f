//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization error: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// A store invariant does not hold (e.g. a verified identity without a
    /// profile). Logged as a fatal inconsistency, surfaced generically.
    #[error("Store inconsistency: {message}")]
    Inconsistency { message: String },

    /// Store or network failure. Safe to retry with backoff; never to be
    /// conflated with an authorization failure.
    #[error("Transient store error: {message}")]
    Transient { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PortalError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::Inconsistency { message: message.into() }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

impl From<mongodb::error::Error> for PortalError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Transient { message: err.to_string() }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal { message: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            PortalError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PortalError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PortalError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PortalError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            PortalError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            PortalError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            PortalError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            PortalError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            PortalError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            PortalError::Transient { .. } => (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if matches!(self, PortalError::Inconsistency { .. }) {
            tracing::error!(error = %self, "store inconsistency surfaced to caller");
        }

        let body = ErrorResponse::new(error_code, self.to_string());
        (status, Json(body)).into_response()
    }
}
