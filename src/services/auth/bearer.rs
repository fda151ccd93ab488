//! `Authorization: Bearer <token>` extraction.
//!
//! The header value itself is never logged, only the endpoint and the caller IP.

use std::fmt;

use axum::http::header;
use thiserror::Error;

use crate::services::auth::pipeline::RawRequest;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("authorization scheme is not bearer")]
    InvalidScheme,
    #[error("empty bearer token")]
    EmptyToken,
}

impl ExtractionFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::InvalidScheme => "invalid_scheme",
            Self::EmptyToken => "empty_token",
        }
    }
}

/// Raw token string taken verbatim from after the `Bearer ` prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print credentials
        f.write_str("BearerToken(<redacted>)")
    }
}

pub fn extract(request: &RawRequest<'_>) -> Result<BearerToken, ExtractionFailure> {
    let result = parse(request);

    if let Err(failure) = &result {
        tracing::warn!(
            error_kind = failure.as_str(),
            endpoint = request.path,
            ip = %request.ip(),
            "bearer token extraction failed"
        );
    }

    result
}

fn parse(request: &RawRequest<'_>) -> Result<BearerToken, ExtractionFailure> {
    // HeaderMap lookups are case-insensitive on the header name.
    let value = request
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(ExtractionFailure::MissingHeader)?;

    // Non-visible-ASCII values cannot carry a Bearer credential.
    let value = value.to_str().map_err(|_| ExtractionFailure::InvalidScheme)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(ExtractionFailure::InvalidScheme)?;

    if token.is_empty() {
        return Err(ExtractionFailure::EmptyToken);
    }

    Ok(BearerToken(token.to_string()))
}
