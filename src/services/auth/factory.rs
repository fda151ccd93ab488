//! Factory: build the process-wide auth components from `Config`.

use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::TokenValidator;
use crate::services::auth::audit::{AuditSink, TracingAuditSink};

pub fn build_token_validator(config: &Config) -> Arc<TokenValidator> {
    let validator = TokenValidator::new(&config.jwt);
    tracing::debug!(?validator, "token validator configured");
    Arc::new(validator)
}

pub fn build_audit_sink() -> Arc<dyn AuditSink> {
    Arc::new(TracingAuditSink)
}
