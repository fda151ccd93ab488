//! Per-route guard middleware: bearer authentication → scope authorization → handler.
//!
//! The required scope is looked up in the `RouteScopeMap` once, when the route is
//! registered, and baked into the middleware state. Requests never consult the map.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::config::ConfigError;
use crate::error::AppError;
use crate::services::auth::pipeline::{GuardPipeline, RawRequest};
use crate::state::AppState;

#[derive(Clone)]
struct RouteGuard {
    state: AppState,
    pipeline: GuardPipeline,
}

/// Attach the guard pipeline for `method path` to `method_router`.
///
/// Fails if the route has no declared scope: a protected route must never be served
/// unguarded.
///
/// 例：
/// ```ignore
/// let read = protect(get(data::read), &state, Method::GET, "/api/data")?;
/// router = router.route("/api/data", read);
/// ```
pub fn protect(
    method_router: MethodRouter<AppState>,
    state: &AppState,
    method: Method,
    path: &str,
) -> Result<MethodRouter<AppState>, ConfigError> {
    let scope = state
        .route_scopes
        .required_scope(&method, path)
        .cloned()
        .ok_or_else(|| ConfigError::Route(format!("{method} {path} has no declared scope")))?;

    tracing::debug!(%method, path, required_scope = %scope, "guarding route");

    let guard = RouteGuard {
        state: state.clone(),
        pipeline: GuardPipeline::protected(scope),
    };

    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    Ok(method_router.route_layer(middleware::from_fn_with_state(guard, guard_middleware)))
}

async fn guard_middleware(
    State(guard): State<RouteGuard>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Only present when served with connect-info (not in in-process tests).
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let ctx = {
        let raw = RawRequest::new(req.method(), original_uri.path(), req.headers(), remote_ip);
        guard
            .pipeline
            .run(&raw, &guard.state.validator, guard.state.audit.as_ref())?
    };

    // middleware → extractor への受け渡し
    if let Some(identity) = ctx.into_identity() {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}
