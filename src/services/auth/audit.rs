//! Authorization audit records and the sink they are handed to.
//!
//! The gateway only emits records. Storage and shipping belong to whatever consumes
//! the `audit` tracing target (or to a custom `AuditSink`).

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-once record of one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    pub subject: String,
    pub route: String,
    pub method: String,
    pub ip: String,
    pub required_scope: String,
    pub granted_scopes: BTreeSet<String>,
    pub outcome: Decision,
    pub timestamp: DateTime<Utc>,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, decision: &AuthorizationDecision);
}

/// Emits decisions as structured `tracing` events under the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, decision: &AuthorizationDecision) {
        match decision.outcome {
            Decision::Deny => {
                // only denials carry the granted scopes
                let user_scopes = decision
                    .granted_scopes
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");

                tracing::warn!(
                    target: "audit",
                    subject = %decision.subject,
                    endpoint = %decision.route,
                    method = %decision.method,
                    ip = %decision.ip,
                    required_scope = %decision.required_scope,
                    user_scopes = %user_scopes,
                    decision = decision.outcome.as_str(),
                    timestamp = %decision.timestamp.to_rfc3339(),
                    "authorization denied: insufficient scope"
                );
            }
            Decision::Allow => {
                tracing::info!(
                    target: "audit",
                    subject = %decision.subject,
                    endpoint = %decision.route,
                    method = %decision.method,
                    required_scope = %decision.required_scope,
                    decision = decision.outcome.as_str(),
                    timestamp = %decision.timestamp.to_rfc3339(),
                    "authorization granted"
                );
            }
        }
    }
}
