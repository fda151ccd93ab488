//! Ordered guard pipeline.
//!
//! Each guard either continues (possibly updating the context) or short-circuits with
//! a rejection. `GuardPipeline::run` stops at the first rejection, so no later guard
//! and no handler runs after a failure.

use std::net::IpAddr;
use std::ops::ControlFlow;

use axum::http::{HeaderMap, Method};

use crate::error::AppError;
use crate::services::auth::access_jwt::TokenValidator;
use crate::services::auth::audit::AuditSink;
use crate::services::auth::authenticate::authenticate;
use crate::services::auth::authorize::{RequiredScope, authorize};
use crate::services::auth::identity::Identity;

/// Read-only view of the incoming request the guards need.
#[derive(Debug, Clone, Copy)]
pub struct RawRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub remote_ip: Option<IpAddr>,
}

impl<'a> RawRequest<'a> {
    pub fn new(
        method: &'a Method,
        path: &'a str,
        headers: &'a HeaderMap,
        remote_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            remote_ip,
        }
    }

    /// Caller IP for logs, `"unknown"` when the transport did not provide one.
    pub fn ip(&self) -> String {
        self.remote_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Default)]
pub struct GuardContext {
    identity: Option<Identity>,
}

impl GuardContext {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn into_identity(self) -> Option<Identity> {
        self.identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Authenticate,
    Authorize(RequiredScope),
}

impl Guard {
    fn check(
        &self,
        request: &RawRequest<'_>,
        ctx: &mut GuardContext,
        validator: &TokenValidator,
        audit: &dyn AuditSink,
    ) -> ControlFlow<AppError> {
        let outcome = match self {
            Guard::Authenticate => authenticate(request, validator).map(|identity| {
                ctx.identity = Some(identity);
            }),
            Guard::Authorize(scope) => {
                authorize(ctx.identity(), scope, request, audit).map_err(AppError::from)
            }
        };

        match outcome {
            Ok(()) => ControlFlow::Continue(()),
            Err(rejection) => ControlFlow::Break(rejection),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPipeline {
    guards: Vec<Guard>,
}

impl GuardPipeline {
    pub fn new(guards: Vec<Guard>) -> Self {
        Self { guards }
    }

    /// authenticate, then require `scope`
    pub fn protected(scope: RequiredScope) -> Self {
        Self::new(vec![Guard::Authenticate, Guard::Authorize(scope)])
    }

    pub fn run(
        &self,
        request: &RawRequest<'_>,
        validator: &TokenValidator,
        audit: &dyn AuditSink,
    ) -> Result<GuardContext, AppError> {
        let mut ctx = GuardContext::default();

        for guard in &self.guards {
            if let ControlFlow::Break(rejection) =
                guard.check(request, &mut ctx, validator, audit)
            {
                return Err(rejection);
            }
        }

        Ok(ctx)
    }
}
