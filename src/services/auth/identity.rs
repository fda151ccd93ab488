use std::collections::BTreeSet;

use crate::services::auth::access_jwt::ClaimSet;

/// The authenticated caller for one request.
///
/// Built from a validated `ClaimSet`, stored in the request extensions by the
/// guard middleware and dropped with the request. Never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    claims: ClaimSet,
}

impl Identity {
    pub fn new(claims: ClaimSet) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> &str {
        self.claims.subject()
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        self.claims.scopes()
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.claims.has_scope(scope)
    }
}
