//! Scope-based authorization (deny-by-default).

use std::fmt;

use chrono::Utc;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth::audit::{AuditSink, AuthorizationDecision, Decision};
use crate::services::auth::identity::Identity;
use crate::services::auth::pipeline::RawRequest;

/// A single capability label a route requires. Non-empty, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequiredScope(String);

impl RequiredScope {
    pub fn new(scope: impl Into<String>) -> Result<Self, ConfigError> {
        let scope = scope.into();
        if scope.is_empty() {
            return Err(ConfigError::Route("required scope must not be empty".into()));
        }
        // a scope with whitespace could never match one entry of the space-separated claim
        if scope.chars().any(char::is_whitespace) {
            return Err(ConfigError::Route(format!(
                "required scope {scope:?} must not contain whitespace"
            )));
        }
        Ok(Self(scope))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequiredScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationFailure {
    /// Ran without a preceding successful authentication: a wiring bug.
    #[error("authorization attempted without an authenticated identity")]
    AuthenticationRequired,
    #[error("missing required scope: {required_scope}")]
    InsufficientScope { required_scope: String },
}

/// Allow iff `required` is an exact member of the identity's scopes.
///
/// Every decision on an authenticated identity is handed to `audit`.
pub fn authorize(
    identity: Option<&Identity>,
    required: &RequiredScope,
    request: &RawRequest<'_>,
    audit: &dyn AuditSink,
) -> Result<(), AuthorizationFailure> {
    let Some(identity) = identity else {
        tracing::error!(
            endpoint = request.path,
            method = %request.method,
            ip = %request.ip(),
            required_scope = %required,
            "authorization guard executed without authentication; guard order is misconfigured"
        );
        return Err(AuthorizationFailure::AuthenticationRequired);
    };

    let outcome = if identity.has_scope(required.as_str()) {
        Decision::Allow
    } else {
        Decision::Deny
    };

    audit.record(&AuthorizationDecision {
        subject: identity.subject().to_string(),
        route: request.path.to_string(),
        method: request.method.to_string(),
        ip: request.ip(),
        required_scope: required.to_string(),
        granted_scopes: identity.scopes().clone(),
        outcome,
        timestamp: Utc::now(),
    });

    match outcome {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(AuthorizationFailure::InsufficientScope {
            required_scope: required.to_string(),
        }),
    }
}
