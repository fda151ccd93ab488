/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - validator: immutable JWT expectations (key / iss / aud), shared by every request
 *   - route_scopes: route -> required scope, read-only after startup
 *   - audit: where authorization decisions are handed off
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{RouteScopeMap, TokenValidator, audit::AuditSink};

#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<TokenValidator>,
    pub route_scopes: Arc<RouteScopeMap>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(
        validator: Arc<TokenValidator>,
        route_scopes: RouteScopeMap,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            validator,
            route_scopes: Arc::new(route_scopes),
            audit,
        }
    }
}
