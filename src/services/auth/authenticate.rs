//! Bearer authentication: extract → validate → Identity.
//!
//! Every failure becomes a uniform 401. The kind is logged server-side, the token and
//! the key never are.

use crate::error::{AppError, GENERIC_TOKEN_MESSAGE};
use crate::services::auth::access_jwt::{TokenError, TokenValidator};
use crate::services::auth::bearer;
use crate::services::auth::identity::Identity;
use crate::services::auth::pipeline::RawRequest;

pub fn authenticate(
    request: &RawRequest<'_>,
    validator: &TokenValidator,
) -> Result<Identity, AppError> {
    let token = bearer::extract(request)?;

    match validator.validate(token.as_str()) {
        Ok(claims) => {
            tracing::info!(
                subject = claims.subject(),
                endpoint = request.path,
                "bearer token validated"
            );
            tracing::debug!(
                issuer = claims.issuer(),
                audience = claims.audience(),
                expires_at = %claims.expires_at(),
                "bearer token claims"
            );
            Ok(Identity::new(claims))
        }
        Err(TokenError::Rejected(kind)) => {
            tracing::warn!(
                error_kind = kind.as_str(),
                endpoint = request.path,
                ip = %request.ip(),
                "bearer token validation failed"
            );
            Err(kind.into())
        }
        Err(TokenError::Internal(err)) => {
            tracing::error!(
                error = %err,
                endpoint = request.path,
                ip = %request.ip(),
                "unexpected error during bearer token validation"
            );
            Err(AppError::unauthorized(GENERIC_TOKEN_MESSAGE))
        }
    }
}
