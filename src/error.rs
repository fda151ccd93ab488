/*
 * Responsibility
 * - The only error type that crosses the guard boundary into an HTTP response
 * - IntoResponse: exactly two public shapes, 401 / 403 with {"error", "message"}
 * - Classified failures (extraction / validation / authorization) are converted here,
 *   never passed upward raw
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::access_jwt::ValidationFailure;
use crate::services::auth::authorize::AuthorizationFailure;
use crate::services::auth::bearer::ExtractionFailure;

/// Returned for unclassified validator errors. Carries no detail.
pub const GENERIC_TOKEN_MESSAGE: &str = "Invalid or malformed token";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: &'static str },
    #[error("forbidden: missing required scope {required_scope}")]
    Forbidden { required_scope: String },
}

impl AppError {
    pub fn unauthorized(message: &'static str) -> Self {
        Self::Unauthorized { message }
    }

    pub fn forbidden(required_scope: impl Into<String>) -> Self {
        Self::Forbidden {
            required_scope: required_scope.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Unauthorized { message } => ErrorResponse {
                error: "unauthorized",
                message: message.to_string(),
            },
            AppError::Forbidden { required_scope } => ErrorResponse {
                error: "forbidden",
                message: format!("Missing required scope: {required_scope}"),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ExtractionFailure> for AppError {
    fn from(e: ExtractionFailure) -> Self {
        match e {
            ExtractionFailure::MissingHeader => {
                AppError::unauthorized("Authorization header is required")
            }
            ExtractionFailure::InvalidScheme | ExtractionFailure::EmptyToken => {
                AppError::unauthorized("Invalid authorization header")
            }
        }
    }
}

impl From<ValidationFailure> for AppError {
    fn from(e: ValidationFailure) -> Self {
        match e {
            ValidationFailure::Expired => AppError::unauthorized("Token has expired"),
            ValidationFailure::InvalidSignature => {
                AppError::unauthorized("Invalid token signature")
            }
            ValidationFailure::ClaimMismatch | ValidationFailure::MalformedClaims => {
                AppError::unauthorized("Token claim verification failed")
            }
        }
    }
}

impl From<AuthorizationFailure> for AppError {
    fn from(e: AuthorizationFailure) -> Self {
        match e {
            AuthorizationFailure::AuthenticationRequired => {
                AppError::unauthorized("Authentication required")
            }
            AuthorizationFailure::InsufficientScope { required_scope } => {
                AppError::forbidden(required_scope)
            }
        }
    }
}
